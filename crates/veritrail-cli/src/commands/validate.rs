//! The `validate` command: wire the stores together, walk the chain, and
//! verify log hashes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use veritrail_chain::{ChainTraverser, LogFileVerifier, ValidationSummary};
use veritrail_core::{TimeRange, TrailIdentity};
use veritrail_store::{
    DigestStore, FsObjectStore, ObjectStore, ObjectStoreFactory, RegionalClientCache,
};

use crate::keys::FileKeySource;
use crate::reporter::StatusReporter;

/// Arguments for `veritrail validate`.
#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Trail ARN (alternative to --account-id/--trail-name/--home-region)
    #[arg(long, env = "VERITRAIL_TRAIL_ARN")]
    trail_arn: Option<String>,

    /// Account that owns the trail
    #[arg(long, env = "VERITRAIL_ACCOUNT_ID", conflicts_with = "trail_arn")]
    account_id: Option<String>,

    /// Trail name
    #[arg(long, env = "VERITRAIL_TRAIL_NAME", conflicts_with = "trail_arn")]
    trail_name: Option<String>,

    /// Region the trail configuration lives in
    #[arg(long, env = "VERITRAIL_HOME_REGION", conflicts_with = "trail_arn")]
    home_region: Option<String>,

    /// Region digests were delivered from (defaults to the home region)
    #[arg(long, env = "VERITRAIL_SOURCE_REGION")]
    source_region: Option<String>,

    /// Bucket holding the digest chain
    #[arg(long, env = "VERITRAIL_BUCKET")]
    bucket: String,

    /// Key prefix digests were delivered under
    #[arg(long, env = "VERITRAIL_PREFIX")]
    prefix: Option<String>,

    /// Start of the validation window (RFC 3339)
    #[arg(long, env = "VERITRAIL_START_TIME")]
    start_time: String,

    /// End of the validation window (RFC 3339, defaults to now)
    #[arg(long, env = "VERITRAIL_END_TIME")]
    end_time: Option<String>,

    /// Root directory of the object-store mirror
    #[arg(long, env = "VERITRAIL_STORE_ROOT")]
    store_root: PathBuf,

    /// JSON file of trusted signing keys ({fingerprint, value} records)
    #[arg(long, env = "VERITRAIL_KEYS_FILE")]
    keys_file: PathBuf,

    /// Suppress per-file valid lines; findings still go to stderr
    #[arg(long)]
    quiet: bool,
}

impl ValidateArgs {
    fn trail(&self) -> anyhow::Result<TrailIdentity> {
        let trail = match &self.trail_arn {
            Some(arn) => TrailIdentity::from_arn(arn)?,
            None => {
                let (Some(account), Some(name), Some(region)) =
                    (&self.account_id, &self.trail_name, &self.home_region)
                else {
                    bail!(
                        "either --trail-arn or all of --account-id, --trail-name, \
                         and --home-region are required"
                    );
                };
                TrailIdentity::new(account, name, region)
            },
        };
        Ok(match &self.source_region {
            Some(region) => trail.with_source_region(region),
            None => trail,
        })
    }

    fn range(&self) -> anyhow::Result<TimeRange> {
        let start = parse_time(&self.start_time).context("parsing --start-time")?;
        Ok(match &self.end_time {
            Some(raw) => {
                let end = parse_time(raw).context("parsing --end-time")?;
                TimeRange::new(start, end)?
            },
            None => TimeRange::through_now(start)?,
        })
    }
}

fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("{raw}: {e}"))
}

/// The mirror is one directory tree regardless of region, so every region
/// shares the same client.
struct MirrorFactory {
    store: Arc<FsObjectStore>,
}

impl ObjectStoreFactory for MirrorFactory {
    fn create(&self, _region: &str) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store) as Arc<dyn ObjectStore>
    }
}

/// Run a full validation pass. Returns the counters for exit-code policy.
pub(crate) async fn run(args: ValidateArgs) -> anyhow::Result<ValidationSummary> {
    let trail = args.trail()?;
    let range = args.range()?;

    let mirror = Arc::new(
        FsObjectStore::open(&args.store_root)
            .with_context(|| format!("opening mirror at {}", args.store_root.display()))?,
    );
    let clients = Arc::new(RegionalClientCache::new(Arc::new(MirrorFactory {
        store: mirror,
    })));
    let keys = Arc::new(FileKeySource::load(&args.keys_file)?);

    let digest_store = DigestStore::new(trail.clone(), args.prefix.clone(), Arc::clone(&clients));
    let traverser = ChainTraverser::new(digest_store, keys, &args.bucket);
    let verifier = LogFileVerifier::new(clients);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, finishing current file");
                cancel.cancel();
            }
        }
    });

    let mut reporter = StatusReporter::new(args.quiet);
    reporter.startup(&trail, &range);

    let mut traversal = traverser.begin(range, cancel.clone()).await?;
    while let Some(digest) = traversal.next_validated(&mut reporter).await? {
        reporter.digest_valid(&digest.bucket, &digest.key);
        verifier
            .verify_all(&digest.manifest.log_files, &cancel, &mut reporter)
            .await?;
    }

    reporter.finish(&range);
    Ok(reporter.summary())
}
