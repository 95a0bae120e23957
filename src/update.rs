use anyhow::Context as _;

use crate::cli::{FetchArgs, MergeArgs};
use crate::layout::ProjectLayout;

/// `fetch` followed by `merge` on the same project root.
///
/// Tables that could not be saved do not stop the merge; they are reported
/// once the merged output is written.
pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(&args.root);
    let root = args.root.clone();

    tracing::info!(root = %layout.root().display(), "update: fetch");
    let fetched = crate::fetch::fetch_all(args).await.context("fetch")?;
    if fetched.saved == 0 {
        tracing::warn!("update: no table was downloaded; merging existing files");
    }

    tracing::info!(root = %layout.root().display(), "update: merge");
    crate::merge::run(MergeArgs { root }).context("merge")?;

    fetched.ensure_written().context("fetch")?;
    Ok(())
}
