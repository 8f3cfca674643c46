//! Cache maintenance commands.

use std::io::Write;

use parlay_core::Namespace;
use parlay_storage::StorageService;

use crate::error::CliResult;

pub async fn keys(
    storage: &StorageService,
    namespace: Namespace,
    out: &mut dyn Write,
) -> CliResult<()> {
    let ids = storage.list_keys(namespace).await;
    if ids.is_empty() {
        writeln!(out, "No cached {} entries", namespace)?;
    }
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}

pub async fn stats(
    storage: &StorageService,
    namespace: Option<Namespace>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let namespaces = match namespace {
        Some(ns) => vec![ns],
        None => Namespace::ALL.to_vec(),
    };

    for ns in namespaces {
        let stats = storage.stats(ns).await;
        writeln!(
            out,
            "{}: {} local ({:.1} KiB), {} remote",
            ns,
            stats.local_count,
            stats.local_kib(),
            stats.remote_count
        )?;
    }
    Ok(())
}

pub async fn prune(
    storage: &StorageService,
    namespace: Namespace,
    out: &mut dyn Write,
) -> CliResult<()> {
    let report = storage.prune(namespace).await?;
    writeln!(
        out,
        "Pruned {} {} entries ({} expired, {} unreadable)",
        report.total(),
        namespace,
        report.expired,
        report.corrupt
    )?;
    Ok(())
}

pub async fn clear(
    storage: &StorageService,
    namespace: Namespace,
    out: &mut dyn Write,
) -> CliResult<()> {
    let removed = storage.clear(namespace).await?;
    writeln!(out, "Removed {} local {} entries", removed, namespace)?;
    Ok(())
}

pub async fn verify(storage: &StorageService, out: &mut dyn Write) -> CliResult<()> {
    if storage.verify_connection().await {
        writeln!(out, "Remote tier reachable")?;
    } else {
        writeln!(out, "Remote tier unreachable, using local storage")?;
    }
    Ok(())
}
