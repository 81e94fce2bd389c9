//! Connection pool utilities

use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Create a connection pool from a database URL.
///
/// No connection is opened here; connections are established on the first
/// `pool.get()`, so a server can start (and reject invalid requests) before
/// the database is reachable.
pub fn create_pool(database_url: &str) -> DbResult<Pool> {
    create_pool_with_config(database_url, DEFAULT_POOL_SIZE)
}

/// Create a connection pool with a custom maximum size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> DbResult<Pool> {
    create_pool_with_manager_config(database_url, NoTls, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a connection pool with an injected TLS connector, `ManagerConfig` and `PoolBuilder`
/// tuning.
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> DbResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| DbError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_lazy() {
        // Nothing listens here; building the pool must still succeed.
        let pool = create_pool_with_config("postgres://nobody@127.0.0.1:1/none", 4).unwrap();
        assert_eq!(pool.status().max_size, 4);
        assert_eq!(pool.status().size, 0);
    }

    #[test]
    fn rejects_malformed_url() {
        let err = create_pool("not a url at all ::").unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }
}
