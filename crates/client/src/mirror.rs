//! Client-held copy of the active team, kept in step with the server session.

use tokio::sync::{Mutex, RwLock, watch};

use crate::api::{TeamSessionApi, TeamSummary};
use crate::error::ClientError;
use crate::storage::SelectionStore;

#[derive(Debug, Clone, Default)]
struct MirrorState {
    organization_id: Option<String>,
    teams: Vec<TeamSummary>,
    active_team: Option<TeamSummary>,
    /// Bumped on every local change so a queued push can tell it is stale.
    generation: u64,
}

/// Mirrors the active team for the current organization.
///
/// Local state is applied before the server is told about it, and no lock on
/// that state is held while the push is in flight. A failed push is logged
/// and the local selection stands; the next successful push or the
/// server-side resolution on the next session read reconciles the two.
///
/// Pushes go out one at a time in the order the changes were made. A push
/// still queued when a newer change lands is dropped in favor of the newer one.
pub struct ActiveTeamMirror<A, S> {
    api: A,
    store: S,
    state: RwLock<MirrorState>,
    reload: Mutex<()>,
    push_lock: Mutex<()>,
    sender: watch::Sender<Option<TeamSummary>>,
}

impl<A: TeamSessionApi, S: SelectionStore> ActiveTeamMirror<A, S> {
    pub fn new(api: A, store: S) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            api,
            store,
            state: RwLock::new(MirrorState::default()),
            reload: Mutex::new(()),
            push_lock: Mutex::new(()),
            sender,
        }
    }

    /// Re-run the selection for a new active organization.
    ///
    /// Order of preference: the remembered team if it is still listed, then
    /// the first listed team, then nothing. `None` clears the selection.
    /// If the team list cannot be loaded the error is returned and the
    /// current selection is left as it was.
    ///
    /// The fallback is the first team of the organization, which need not be
    /// one the user has joined. The server then rejects the push with
    /// `403`, the local selection stands and the next reload reconciles it.
    pub async fn on_active_organization_changed(
        &self,
        organization_id: Option<&str>,
    ) -> Result<Option<TeamSummary>, ClientError> {
        let reload = self.reload.lock().await;

        let Some(organization_id) = organization_id else {
            let generation = {
                let mut state = self.state.write().await;
                *state = MirrorState {
                    generation: state.generation + 1,
                    ..MirrorState::default()
                };
                self.publish(None);
                self.forget();
                state.generation
            };
            drop(reload);
            self.push(generation, None).await;
            return Ok(None);
        };

        let teams = match self.api.list_teams(organization_id).await {
            Ok(teams) => teams,
            Err(err) => {
                tracing::warn!(
                    organization_id,
                    error = %err,
                    "failed to load teams for active organization"
                );
                return Err(err);
            }
        };

        let remembered = match self.store.load() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read remembered team");
                None
            }
        };

        let readopted = remembered
            .as_deref()
            .and_then(|id| teams.iter().find(|team| team.id == id))
            .cloned();

        let selected = match readopted {
            Some(team) => {
                tracing::debug!(team_id = %team.id, "re-adopting remembered team");
                Some(team)
            }
            None => teams.first().cloned(),
        };

        let generation = {
            let mut state = self.state.write().await;
            *state = MirrorState {
                organization_id: Some(organization_id.to_string()),
                teams,
                active_team: selected.clone(),
                generation: state.generation + 1,
            };
            self.publish(selected.clone());

            match &selected {
                Some(team) if remembered.as_deref() != Some(team.id.as_str()) => {
                    self.remember(&team.id)
                }
                Some(_) => {}
                None => self.forget(),
            }
            state.generation
        };
        drop(reload);

        self.push(generation, selected.as_ref().map(|team| team.id.as_str()))
            .await;

        Ok(selected)
    }

    /// Explicitly choose a team from the loaded list.
    pub async fn select_team(&self, team_id: &str) -> Result<TeamSummary, ClientError> {
        let (team, generation) = {
            let mut state = self.state.write().await;

            let team = state
                .teams
                .iter()
                .find(|team| team.id == team_id)
                .cloned()
                .ok_or_else(|| ClientError::UnknownTeam(team_id.to_string()))?;

            state.active_team = Some(team.clone());
            state.generation += 1;
            self.publish(Some(team.clone()));
            self.remember(&team.id);
            (team, state.generation)
        };

        self.push(generation, Some(&team.id)).await;

        Ok(team)
    }

    /// The currently selected team.
    pub async fn current(&self) -> Option<TeamSummary> {
        self.state.read().await.active_team.clone()
    }

    /// Teams loaded for the current organization, in server order.
    pub async fn teams(&self) -> Vec<TeamSummary> {
        self.state.read().await.teams.clone()
    }

    pub async fn organization_id(&self) -> Option<String> {
        self.state.read().await.organization_id.clone()
    }

    /// Receive every change of the selected team.
    pub fn subscribe(&self) -> watch::Receiver<Option<TeamSummary>> {
        self.sender.subscribe()
    }

    fn publish(&self, team: Option<TeamSummary>) {
        self.sender.send_if_modified(|current| {
            if *current == team {
                false
            } else {
                *current = team;
                true
            }
        });
    }

    fn remember(&self, team_id: &str) {
        if let Err(err) = self.store.save(team_id) {
            tracing::warn!(team_id, error = %err, "failed to remember selected team");
        }
    }

    fn forget(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear remembered team");
        }
    }

    async fn push(&self, generation: u64, team_id: Option<&str>) {
        let _ordered = self.push_lock.lock().await;

        let latest = self.state.read().await.generation;
        if latest != generation {
            tracing::debug!(
                team_id = team_id.unwrap_or("none"),
                "skipping push superseded by a newer selection"
            );
            return;
        }

        if let Err(err) = self.api.set_active_team(team_id).await {
            tracing::warn!(
                team_id = team_id.unwrap_or("none"),
                error = %err,
                "failed to push active team to server session"
            );
        }
    }
}
