//! Test harness with testcontainers for Postgres-backed tests.
//!
//! One Postgres container is shared by every test in the binary. The
//! container starts and migrations run on first use.

use anyhow::{Context, Result};
use chamber_core::kernel::{
    InMemoryBlobStore, MockMessagingService, PgStore, ServerDeps, TEST_JWT_ISSUER,
    TEST_JWT_SECRET,
};
use chamber_core::domains::auth::JwtService;
use chamber_core::OtpPolicy;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Postgres stores with in-memory blobs and an SMS spy.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// #[ignore = "requires Docker"]
/// async fn my_test(ctx: &TestHarness) {
///     let deps = ctx.deps();
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub blobs: Arc<InMemoryBlobStore>,
    pub messaging: Arc<MockMessagingService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self {
            db_pool,
            blobs: Arc::new(InMemoryBlobStore::new()),
            messaging: Arc::new(MockMessagingService::new()),
        })
    }

    pub fn store(&self) -> Arc<PgStore> {
        Arc::new(PgStore::new(self.db_pool.clone()))
    }

    pub fn deps(&self) -> ServerDeps {
        let store = self.store();
        ServerDeps::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            self.blobs.clone(),
            self.messaging.clone(),
            Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
            OtpPolicy::default(),
        )
    }
}
