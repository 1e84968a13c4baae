use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use deal_core::db::{
    DbConfig, MemoryRepositoryFactory, PropertyRepository, RepositoryError, RepositoryRegistry,
    RepositorySink,
};
use deal_core::{
    AssumptionProfile, DealAnalysis, DealSession, EngineConfig, Edit, HistoryStack, ListingId,
    Property, Underwriter,
};
use deal_db_sqlite::SqliteRepositoryFactory;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP, parse_command};
use crate::logging;
use crate::render;

/// Registers every backend the binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

pub async fn open_repository(config: &DbConfig) -> Result<Arc<dyn PropertyRepository>> {
    debug!(backend = %config.backend, "connecting");
    let repo = build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open {} backend", config.backend))?;
    Ok(Arc::from(repo))
}

pub async fn load_listing(
    repo: &dyn PropertyRepository,
    listing_id: &ListingId,
) -> Result<Property> {
    match repo.get_property(listing_id).await {
        Ok(property) => Ok(property),
        Err(RepositoryError::NotFound) => anyhow::bail!("No listing with id {listing_id}"),
        Err(e) => Err(e).with_context(|| format!("Failed to load listing {listing_id}")),
    }
}

/// Analysis of `property` with its stored override, without opening a
/// session.
pub async fn analyze(
    repo: &dyn PropertyRepository,
    property: &Property,
    config: &EngineConfig,
) -> Result<DealAnalysis> {
    let overrides = repo
        .get_override(&property.listing_id)
        .await
        .context("Failed to load stored override")?
        .unwrap_or_default();
    let rent_table = repo
        .load_rent_table()
        .await
        .context("Failed to load market rents")?;

    let profile = AssumptionProfile::from(&property.listing_id);
    let underwriter = Underwriter::new(&rent_table, config.for_profile(profile), &config.expenses);
    Ok(underwriter.analyze(property, &overrides))
}

/// Opens a session that writes every change back through `repo`.
///
/// A listing always picks up its stored override. Every custom property
/// shares the `CUSTOM` record, so it is only picked up when `resume` is set.
///
/// Must be called from within a tokio runtime. Await
/// [`RepositorySink::flush`] on the returned sink before exiting.
pub async fn open_session(
    repo: Arc<dyn PropertyRepository>,
    property: Property,
    config: EngineConfig,
    resume: bool,
) -> Result<(DealSession, Arc<RepositorySink>)> {
    let stored = if property.listing_id.is_custom() && !resume {
        debug!("starting custom property without stored override");
        None
    } else {
        repo.get_override(&property.listing_id)
            .await
            .context("Failed to load stored override")?
    };
    let rent_table = repo
        .load_rent_table()
        .await
        .context("Failed to load market rents")?;

    let sink = Arc::new(RepositorySink::new(repo, Handle::current()));
    let session = DealSession::open(
        property,
        stored,
        rent_table,
        config,
        sink.clone(),
        HistoryStack::new(),
    );

    Ok((session, sink))
}

/// Reads commands from `input` until it ends or `quit` is entered.
///
/// Command errors are reported to `out` and the loop carries on.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut DealSession,
    input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(
        out,
        "{}",
        render::render_analysis(session.property(), session.profile(), session.analysis())
    )?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };

        match command {
            Command::Edit(edit) => apply(session, edit, out)?,
            Command::Property(changes) => {
                let property = changes.apply_to(session.property());
                apply(session, Edit::ReplaceProperty(property), out)?;
            }
            Command::Undo => {
                if session.undo() {
                    writeln!(out, "{}", render::render_summary(session.analysis()))?;
                } else {
                    writeln!(out, "nothing to undo")?;
                }
            }
            Command::Redo => {
                if session.redo() {
                    writeln!(out, "{}", render::render_summary(session.analysis()))?;
                } else {
                    writeln!(out, "nothing to redo")?;
                }
            }
            Command::Show => writeln!(
                out,
                "{}",
                render::render_analysis(session.property(), session.profile(), session.analysis())
            )?,
            Command::History => writeln!(out, "{}", render::render_history(session.history()))?,
            Command::Log(level) => match logging::set_log_level(&level) {
                Ok(()) => writeln!(out, "log level set to {level}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }
    }

    info!(
        listing = %session.property().listing_id,
        edits = session.history().len().saturating_sub(1),
        "session closed"
    );
    Ok(())
}

fn apply<W: Write>(
    session: &mut DealSession,
    edit: Edit,
    out: &mut W,
) -> Result<()> {
    match session.apply(edit) {
        Ok(analysis) => writeln!(out, "{}", render::render_summary(analysis))?,
        Err(e) => {
            warn!(error = %e, "edit rejected");
            writeln!(out, "error: {e}")?;
        }
    }
    Ok(())
}
