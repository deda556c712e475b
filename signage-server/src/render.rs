//! Descriptor rendering on top of the snapshot store.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use log::{debug, error, warn};
use signage_descriptor::{Descriptor, DescriptorAssembler, DescriptorError};
use thiserror::Error;
use tokio::task::JoinError;

use crate::store::{Store, StoreError};

/// Errors while rendering a player's descriptor.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The build task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] JoinError),
}

impl RenderError {
    /// Returns true if the failure is an environment fault.
    pub fn is_environment_fault(&self) -> bool {
        matches!(self, RenderError::Descriptor(e) if e.is_environment_fault())
    }
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Build the descriptor for one player as of `now`.
///
/// A missing playlist is tolerated: the descriptor is built without items.
pub async fn render_player(
    store: &Store,
    player_id: &str,
    now: NaiveDate,
) -> Result<Descriptor, RenderError> {
    let record = store.load_player(player_id).await?;

    let items = match record.playlist.as_deref() {
        Some(playlist_id) => match store.load_playlist(playlist_id).await? {
            Some(items) => items,
            None => {
                warn!("Player {}: playlist {:?} not found, rendering without items", player_id, playlist_id);
                String::new()
            }
        },
        None => String::new(),
    };

    let template = store.template();
    let descriptor = DescriptorAssembler::new(now)
        .configuration(&record.configuration)
        .template(&template)
        .items(&items)
        .build()?;

    debug!(
        "Player {} ({}): descriptor built ({} bytes, refresh {}s, {} command(s))",
        player_id,
        record.configuration.model.display_name(),
        descriptor.text.len(),
        descriptor.refresh_seconds,
        descriptor.commands.len()
    );
    Ok(descriptor)
}

/// Build descriptors for every stored player, one task per player.
///
/// Every player gets an entry; a task that fails to join is reported as
/// [`RenderError::Task`].
pub async fn render_all(
    store: Arc<Store>,
    now: NaiveDate,
) -> Result<Vec<(String, Result<Descriptor, RenderError>)>, StoreError> {
    let ids = store.player_ids().await?;

    let handles = ids.iter().cloned().map(|id| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { render_player(&store, &id, now).await })
    });

    let joined = join_all(handles).await;
    Ok(collect_joined(ids, joined))
}

fn collect_joined(
    ids: Vec<String>,
    joined: Vec<Result<Result<Descriptor, RenderError>, JoinError>>,
) -> Vec<(String, Result<Descriptor, RenderError>)> {
    ids.into_iter()
        .zip(joined)
        .map(|(id, joined)| {
            let result = joined.unwrap_or_else(|e| {
                error!("Player {}: render task failed: {}", id, e);
                Err(RenderError::Task(e))
            });
            (id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::fixture;
    use signage_descriptor::PlayerCommand;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 16).unwrap()
    }

    #[tokio::test]
    async fn test_render_player() {
        let dir = fixture();
        let store = Store::open(dir.path()).await.unwrap();
        let descriptor = render_player(&store, "lobby", date()).await.unwrap();

        assert_eq!(descriptor.refresh_seconds, 1800);
        assert_eq!(descriptor.commands, vec![PlayerCommand::Reboot]);
        assert!(descriptor.text.contains("news.mp4"));
        assert!(!descriptor.text.contains("sport.mp4"));
        assert!(descriptor.text.contains("wallclock(R/2024-04-16+w1T22:00:00/P1W)"));
        assert!(descriptor.text.contains("content=\"reboot\""));
    }

    #[tokio::test]
    async fn test_render_player_without_playlist_file() {
        let dir = fixture();
        let store = Store::open(dir.path()).await.unwrap();
        let descriptor = render_player(&store, "wall", date()).await.unwrap();
        assert!(descriptor.text.contains("<par></par>"));
        assert!(descriptor.text.contains("regionName=\"main\" top=\"0\" left=\"0\" width=\"1440\""));
        assert!(!descriptor.text.contains("adapi:blankScreen"));
    }

    #[tokio::test]
    async fn test_environment_fault_is_reported() {
        let dir = fixture();
        let store = Store::open(dir.path()).await.unwrap();
        let err = render_player(&store, "lobby", NaiveDate::MIN).await.unwrap_err();
        assert!(err.is_environment_fault());

        let err = render_player(&store, "nobody", date()).await.unwrap_err();
        assert!(!err.is_environment_fault());
    }

    #[tokio::test]
    async fn test_render_all() {
        let dir = fixture();
        let store = Arc::new(Store::open(dir.path()).await.unwrap());
        let results = render_all(store, date()).await.unwrap();
        let mut ids: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["lobby", "wall"]);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn test_failed_task_keeps_its_player_entry() {
        let dir = fixture();
        let store = Store::open(dir.path()).await.unwrap();
        let built = render_player(&store, "lobby", date()).await;
        let panicked = tokio::spawn(async { panic!("build panicked") }).await.unwrap_err();

        let results = collect_joined(
            vec!["lobby".to_string(), "wall".to_string()],
            vec![Ok(built), Err(panicked)],
        );
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "wall");
        assert!(matches!(results[1].1, Err(RenderError::Task(_))));
        assert!(!results[1].1.as_ref().unwrap_err().is_environment_fault());
    }
}
