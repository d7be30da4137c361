use crate::errors::PersistenceError;
use crate::{config::StateStoreConfig, policies::BanditState};

use actix::prelude::*;
use std::{collections::HashMap, fs::File, io::BufReader, time::Duration};
use tracing::{info, warn};
use uuid::Uuid;

/// Keeps the last snapshot of every experiment and mirrors them to a JSON file.
pub struct StateStore {
    storage: HashMap<Uuid, BanditState>,
    config: StateStoreConfig,
    // set by every save or delete since the last successful write
    dirty: bool,
}

impl StateStore {
    pub fn new(config: StateStoreConfig) -> Self {
        let storage = File::open(&config.path)
            .map(|file| {
                let reader = BufReader::new(file);
                serde_json::from_reader(reader).unwrap_or_else(|err| {
                    warn!(path = ?config.path, error = %err, "Ignoring unreadable state store");
                    HashMap::new()
                })
            })
            .unwrap_or_default();

        Self {
            storage,
            config,
            dirty: false,
        }
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        if !self.dirty {
            return Ok(());
        }

        info!(
            path = ?self.config.path,
            num_experiments = %self.storage.len(),
            "Persisting state store"
        );

        let serialized = serde_json::to_string(&self.storage)?;
        std::fs::write(&self.config.path, serialized)?;
        self.dirty = false;
        Ok(())
    }
}

impl Actor for StateStore {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(num_experiments = %self.storage.len(), "Starting StateStore actor");
        ctx.run_interval(
            Duration::from_secs(self.config.persist_every),
            |state_store, _| {
                if let Err(err) = state_store.persist() {
                    warn!(error = %err, "Failed to persist state store");
                }
            },
        );
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        if let Err(err) = self.persist() {
            warn!(error = %err, "Failed to persist state store on shutdown");
        }
    }
}

// Messages
#[derive(Message)]
#[rtype(result = "()")]
pub struct SaveState {
    pub experiment_id: Uuid,
    pub state: BanditState,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct DeleteState {
    pub experiment_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "Option<BanditState>")]
pub struct LoadState {
    pub experiment_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "HashMap<Uuid, BanditState>")]
pub struct LoadAllStates;

#[derive(Message)]
#[rtype(result = "Result<(), PersistenceError>")]
pub struct Persist;

// Handlers
impl Handler<SaveState> for StateStore {
    type Result = ();

    fn handle(&mut self, msg: SaveState, _: &mut Self::Context) -> Self::Result {
        self.storage.insert(msg.experiment_id, msg.state);
        self.dirty = true;
    }
}

impl Handler<DeleteState> for StateStore {
    type Result = ();

    fn handle(&mut self, msg: DeleteState, _: &mut Self::Context) -> Self::Result {
        if self.storage.remove(&msg.experiment_id).is_some() {
            self.dirty = true;
        }
    }
}

impl Handler<LoadState> for StateStore {
    type Result = Option<BanditState>;

    fn handle(&mut self, msg: LoadState, _: &mut Self::Context) -> Self::Result {
        self.storage.get(&msg.experiment_id).cloned()
    }
}

impl Handler<LoadAllStates> for StateStore {
    type Result = MessageResult<LoadAllStates>;

    fn handle(&mut self, _: LoadAllStates, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.storage.clone())
    }
}

impl Handler<Persist> for StateStore {
    type Result = Result<(), PersistenceError>;

    fn handle(&mut self, _: Persist, _: &mut Self::Context) -> Self::Result {
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::PathBuf;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("state-store-{}.json", Uuid::new_v4()))
    }

    fn make_config(path: &PathBuf) -> StateStoreConfig {
        StateStoreConfig {
            path: path.clone(),
            persist_every: 86_400,
        }
    }

    fn make_state() -> BanditState {
        BanditState {
            arms: 2,
            gamma: 0.5,
            tau: 1.0,
            counts: vec![1, 3],
            values: vec![0.5, 2.25],
        }
    }

    #[actix::test]
    async fn save_load_delete() {
        let path = temp_path();
        let store = StateStore::new(make_config(&path)).start();
        let experiment_id = Uuid::new_v4();

        store
            .send(SaveState {
                experiment_id,
                state: make_state(),
            })
            .await
            .unwrap();
        assert_eq!(
            store.send(LoadState { experiment_id }).await.unwrap(),
            Some(make_state())
        );

        store.send(DeleteState { experiment_id }).await.unwrap();
        assert_eq!(store.send(LoadState { experiment_id }).await.unwrap(), None);
        assert!(store.send(LoadAllStates).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn reloads_from_file() {
        let path = temp_path();
        let experiment_id = Uuid::new_v4();

        let store = StateStore::new(make_config(&path)).start();
        store
            .send(SaveState {
                experiment_id,
                state: make_state(),
            })
            .await
            .unwrap();
        store.send(Persist).await.unwrap().unwrap();

        let reloaded = StateStore::new(make_config(&path)).start();
        let states = reloaded.send(LoadAllStates).await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states.get(&experiment_id), Some(&make_state()));

        let _ = fs::remove_file(&path);
    }

    #[actix::test]
    async fn deleting_last_experiment_reaches_file() {
        let path = temp_path();
        let experiment_id = Uuid::new_v4();

        let store = StateStore::new(make_config(&path)).start();
        store
            .send(SaveState {
                experiment_id,
                state: make_state(),
            })
            .await
            .unwrap();
        store.send(Persist).await.unwrap().unwrap();
        store.send(DeleteState { experiment_id }).await.unwrap();
        store.send(Persist).await.unwrap().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        let reloaded = StateStore::new(make_config(&path));
        assert!(reloaded.storage.is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn nothing_written_without_changes() {
        let path = temp_path();
        let mut store = StateStore::new(make_config(&path));

        store.persist().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_path();
        fs::write(&path, "not json").unwrap();

        let store = StateStore::new(make_config(&path));
        assert!(store.storage.is_empty());

        let _ = fs::remove_file(&path);
    }
}
