//! Refresh cycle and poll loop
//!
//! Each cycle fetches customer, package and connection records from the
//! source, groups them by account UPRN and derives pricing for every package.

use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::services::pricing::PricingResolver;
use crate::services::source::AccountSource;
use crate::types::{
    Account, Connection, Customer, HypermonError, Package, PricedPackage, Result, SourceError,
};

/// Default time between refreshes
pub const SCAN_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Everything known about one premise after a refresh
#[derive(Debug, Clone)]
pub struct AccountData {
    pub account: Account,
    pub packages: Vec<PricedPackage>,
    pub connections: Vec<Connection>,
}

impl AccountData {
    pub fn package(&self, package_id: &str) -> Option<&PricedPackage> {
        self.packages.iter().find(|p| p.package.id == package_id)
    }

    pub fn connection(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone)]
pub struct CoordinatorData {
    pub customer: Customer,
    /// Keyed by UPRN rendered as a string
    pub accounts: BTreeMap<String, AccountData>,
    /// Reference date the pricing was resolved against
    pub resolved_on: NaiveDate,
}

/// Drives refreshes against an [`AccountSource`]
pub struct Coordinator<S> {
    source: Arc<S>,
    scan_interval: Duration,
}

impl<S: AccountSource + 'static> Coordinator<S> {
    pub fn new(source: S, scan_interval: Duration) -> Self {
        Self {
            source: Arc::new(source),
            scan_interval,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one blocking refresh with the given reference date
    pub fn refresh(&self, today: NaiveDate) -> Result<CoordinatorData> {
        refresh_with(self.source.as_ref(), today)
    }

    /// Run one refresh on the blocking pool, resolving against today's date
    pub async fn refresh_async(&self) -> Result<CoordinatorData> {
        let source = Arc::clone(&self.source);
        let today = Local::now().date_naive();
        tokio::task::spawn_blocking(move || refresh_with(source.as_ref(), today))
            .await
            .map_err(|e| HypermonError::UpdateFailed(format!("refresh task failed: {}", e)))?
    }

    /// Refresh every scan interval until `on_update` breaks, Ctrl-C is
    /// received, or the credentials are rejected.
    ///
    /// A failed first cycle is returned as an error. Later failures other than
    /// authentication failures are logged and retried at the next tick.
    pub async fn run<F>(&self, on_update: F) -> Result<()>
    where
        F: FnMut(&CoordinatorData) -> ControlFlow<()>,
    {
        self.run_until(tokio::signal::ctrl_c(), on_update).await
    }

    /// Poll loop stopped by `shutdown`, which is polled across cycles so a
    /// signal raised mid-refresh is not lost
    async fn run_until<Shutdown, F>(&self, shutdown: Shutdown, mut on_update: F) -> Result<()>
    where
        Shutdown: Future,
        F: FnMut(&CoordinatorData) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut first_cycle = true;

        loop {
            let result = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("interrupted, stopping poll loop");
                    return Ok(());
                }
                result = async {
                    ticker.tick().await;
                    self.refresh_async().await
                } => result,
            };

            match result {
                Ok(data) => {
                    tracing::info!(
                        source = self.source.name(),
                        accounts = data.accounts.len(),
                        "refresh complete"
                    );
                    if on_update(&data).is_break() {
                        return Ok(());
                    }
                }
                Err(err @ HypermonError::AuthFailed(_)) => return Err(err),
                Err(err) if first_cycle => return Err(err),
                Err(err) => {
                    tracing::warn!("refresh failed, retrying in {:?}: {}", self.scan_interval, err);
                }
            }
            first_cycle = false;
        }
    }
}

/// One refresh cycle against any source
pub fn refresh_with<S: AccountSource + ?Sized>(
    source: &S,
    today: NaiveDate,
) -> Result<CoordinatorData> {
    let (customer, packages, connections) = fetch(source).map_err(|err| {
        tracing::error!("Error updating Hyperoptic data: {}", err);
        match err {
            SourceError::Unauthorized => {
                HypermonError::AuthFailed("Invalid email or password".to_string())
            }
            other => {
                HypermonError::UpdateFailed(format!("Error communicating with API: {}", other))
            }
        }
    })?;

    Ok(build_data(customer, packages, connections, today))
}

fn fetch<S: AccountSource + ?Sized>(
    source: &S,
) -> std::result::Result<(Customer, Vec<Package>, Vec<Connection>), SourceError> {
    let customer = source.get_customer()?;
    let packages = source.get_my_packages()?;
    let connections = source.get_my_connections()?;
    Ok((customer, packages, connections))
}

/// Group fetched records by account and attach resolved pricing.
///
/// The provider does not scope packages to a premise, so every account
/// lists every package; connections are matched on `premiseUprn`.
pub fn build_data(
    customer: Customer,
    packages: Vec<Package>,
    connections: Vec<Connection>,
    today: NaiveDate,
) -> CoordinatorData {
    let resolver = PricingResolver::new(today);

    // Order of the collected vec follows the source order
    let priced: Vec<PricedPackage> = packages
        .into_par_iter()
        .map(|package| {
            let pricing = resolver.resolve(package.pricing());
            PricedPackage {
                package: Arc::new(package),
                pricing,
            }
        })
        .collect();

    let accounts = customer
        .accounts
        .iter()
        .map(|account| {
            let account_connections = connections
                .iter()
                .filter(|c| c.premise_uprn == Some(account.uprn))
                .cloned()
                .collect();

            (
                account.uprn.to_string(),
                AccountData {
                    account: account.clone(),
                    packages: priced.clone(),
                    connections: account_connections,
                },
            )
        })
        .collect();

    CoordinatorData {
        customer,
        accounts,
        resolved_on: today,
    }
}
