use crate::actors::experiment::{
    Delete, Experiment, ExportState, Flush, GetStats, Ping, Reset, RestoreState, Reward, RewardBatch,
    SelectArm,
};
use crate::actors::state_store::{LoadAllStates, Persist, StateStore};
use crate::config::ExperimentConfig;
use crate::errors::{RepositoryError, ServiceError};
use crate::policies::{
    BanditState, BatchUpdateElement, PolicyStats, PolicyType, Softmax, TracingRecorder,
};

use actix::prelude::*;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Repository {
    experiments: HashMap<Uuid, Addr<Experiment>>,
    experiment_config: ExperimentConfig,
    state_store: Addr<StateStore>,
}

impl Repository {
    pub fn new(experiment_config: ExperimentConfig, state_store: Addr<StateStore>) -> Self {
        Self {
            experiments: HashMap::new(),
            experiment_config,
            state_store,
        }
    }

    pub async fn load_experiments(&mut self) -> Result<(), ServiceError> {
        let states = self
            .state_store
            .send(LoadAllStates)
            .await
            .map_err(|err| ServiceError::Mailbox {
                actor: "StateStore",
                source: err,
            })?;

        info!(num_experiments = %states.len(), "Loading experiments");
        states
            .into_iter()
            .for_each(|(experiment_id, state)| match Softmax::from_state(state, None) {
                Ok(policy) => {
                    self.create_experiment(Some(experiment_id), policy);
                    info!(id = %experiment_id, "Loaded experiment");
                }
                Err(err) => warn!(id = %experiment_id, error = %err, "Skipping stored experiment"),
            });

        Ok(())
    }

    fn get_experiment_address(
        &self,
        experiment_id: Uuid,
    ) -> Result<&Addr<Experiment>, RepositoryError> {
        self.experiments
            .get(&experiment_id)
            .ok_or(RepositoryError::ExperimentNotFound(experiment_id))
    }

    async fn send_to_experiment<M>(
        &self,
        experiment_id: Uuid,
        message: M,
    ) -> Result<M::Result, ServiceError>
    where
        M: Message + Send + 'static,
        M::Result: Send + 'static,
        Experiment: Handler<M>,
    {
        self.get_experiment_address(experiment_id)?
            .send(message)
            .await
            .map_err(|err| ServiceError::Mailbox {
                actor: "Experiment",
                source: err,
            })
    }

    pub fn list_experiments(&self) -> Vec<Uuid> {
        self.experiments.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.experiments
            .drain()
            .for_each(|(_, address)| address.do_send(Delete));
    }

    fn with_tracing_recorder(experiment_id: Uuid, policy: Softmax) -> Softmax {
        policy.with_recorder(TracingRecorder::new(experiment_id))
    }

    pub fn create_experiment(&mut self, experiment_id: Option<Uuid>, policy: Softmax) -> Uuid {
        let experiment_id = experiment_id.unwrap_or(Uuid::new_v4());
        let policy = Self::with_tracing_recorder(experiment_id, policy);
        let address = Experiment::new(
            experiment_id,
            policy,
            self.state_store.clone(),
            self.experiment_config.save_every,
        )
        .start();

        self.experiments.insert(experiment_id, address);

        experiment_id
    }

    pub fn create_experiment_from_type(
        &mut self,
        policy_type: PolicyType,
    ) -> Result<Uuid, ServiceError> {
        let policy = policy_type.into_inner()?;
        Ok(self.create_experiment(None, policy))
    }

    pub fn delete_experiment(&mut self, experiment_id: Uuid) -> Result<(), ServiceError> {
        self.get_experiment_address(experiment_id)?.do_send(Delete);
        self.experiments.remove(&experiment_id);
        Ok(())
    }

    /// Saves every experiment into the state store and writes the store to disk.
    pub async fn flush(&self) -> Result<(), ServiceError> {
        for &experiment_id in self.experiments.keys() {
            self.send_to_experiment(experiment_id, Flush).await?;
        }

        self.state_store
            .send(Persist)
            .await
            .map_err(|err| ServiceError::Mailbox {
                actor: "StateStore",
                source: err,
            })?
            .map_err(ServiceError::from)
    }

    pub async fn ping_experiment(&self, experiment_id: Uuid) -> Result<(), ServiceError> {
        self.send_to_experiment(experiment_id, Ping).await
    }

    pub async fn reset_experiment(&self, experiment_id: Uuid) -> Result<(), ServiceError> {
        self.send_to_experiment(experiment_id, Reset).await
    }

    pub async fn draw_experiment(&self, experiment_id: Uuid) -> Result<usize, ServiceError> {
        self.send_to_experiment(experiment_id, SelectArm).await
    }

    pub async fn update_experiment(
        &self,
        experiment_id: Uuid,
        arm_id: usize,
        reward: f64,
    ) -> Result<(), ServiceError> {
        self.send_to_experiment(experiment_id, Reward { arm_id, reward })
            .await?
            .map_err(ServiceError::from)
    }

    pub async fn batch_update_experiment(
        &self,
        experiment_id: Uuid,
        updates: Vec<BatchUpdateElement>,
    ) -> Result<(), ServiceError> {
        self.send_to_experiment(experiment_id, RewardBatch { updates })
            .await?
            .map_err(ServiceError::from)
    }

    pub async fn export_experiment(&self, experiment_id: Uuid) -> Result<BanditState, ServiceError> {
        self.send_to_experiment(experiment_id, ExportState).await
    }

    pub async fn restore_experiment(
        &self,
        experiment_id: Uuid,
        state: BanditState,
    ) -> Result<(), ServiceError> {
        self.send_to_experiment(experiment_id, RestoreState { state })
            .await?
            .map_err(ServiceError::from)
    }

    pub async fn get_experiment_stats(
        &self,
        experiment_id: Uuid,
    ) -> Result<PolicyStats, ServiceError> {
        self.send_to_experiment(experiment_id, GetStats).await
    }
}
