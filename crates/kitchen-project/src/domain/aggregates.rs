//! Aggregate roots for the Project context.

use chrono::{DateTime, Utc};
use kitchen_core::access::{Actor, Operation};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    DirectoryEvent, DirectoryEventKind, PhaseTransitioned, ProjectCreated, ProjectDeleted,
    ProjectEvent, ProjectEventKind, ProjectListed, ProjectUnlisted,
};
use super::phase::{Phase, Transition, classify_transition};

/// The aggregate root for a project.
#[derive(Debug)]
pub struct Project {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Project title.
    pub title: String,
    /// Project description.
    pub description: String,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Creator of the project.
    pub owner_id: String,
    /// When the project was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the project last changed.
    pub updated_at: Option<DateTime<Utc>>,
    /// Set once the project is deleted.
    pub deleted: bool,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ProjectEvent>,
}

impl Project {
    /// Creates an empty project shell for reconstitution.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            title: String::new(),
            description: String::new(),
            phase: Phase::Cooking,
            owner_id: String::new(),
            created_at: None,
            updated_at: None,
            deleted: false,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        kind: ProjectEventKind,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) {
        let event = ProjectEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                recorded_by: recorded_by.to_owned(),
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Creates the project, producing a `ProjectCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title is empty or whitespace.
    pub fn create(
        &mut self,
        title: &str,
        description: Option<&str>,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation(
                "project title must not be empty".to_owned(),
            ));
        }
        self.record(
            ProjectEventKind::ProjectCreated(ProjectCreated {
                project_id: self.id,
                title: title.to_owned(),
                description: description.unwrap_or_default().trim().to_owned(),
                owner_id: actor.user_id.clone(),
            }),
            correlation_id,
            &actor.user_id,
            clock,
        );
        Ok(())
    }

    /// Moves the project to `target`. Returns `false` when the project is
    /// already there, in which case no event is produced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-privileged actors and
    /// `DomainError::Validation` for transitions outside the lifecycle.
    pub fn transition_phase(
        &mut self,
        target: Phase,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        actor.authorize(Operation::TransitionPhase)?;
        if classify_transition(self.phase, target)? == Transition::Unchanged {
            return Ok(false);
        }
        self.record(
            ProjectEventKind::PhaseTransitioned(PhaseTransitioned {
                project_id: self.id,
                from: self.phase,
                to: target,
            }),
            correlation_id,
            &actor.user_id,
            clock,
        );
        Ok(true)
    }

    /// Deletes the project, producing a `ProjectDeleted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-privileged actors.
    pub fn delete(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        actor.authorize(Operation::DeleteProject)?;
        self.record(
            ProjectEventKind::ProjectDeleted(ProjectDeleted {
                project_id: self.id,
            }),
            correlation_id,
            &actor.user_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for Project {
    type Event = ProjectEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            ProjectEventKind::ProjectCreated(payload) => {
                self.title.clone_from(&payload.title);
                self.description.clone_from(&payload.description);
                self.owner_id.clone_from(&payload.owner_id);
                self.phase = Phase::Cooking;
                self.created_at = Some(event.metadata.occurred_at);
            }
            ProjectEventKind::PhaseTransitioned(payload) => {
                self.phase = payload.to;
            }
            ProjectEventKind::ProjectDeleted(_) => {
                self.deleted = true;
            }
        }
        self.updated_at = Some(event.metadata.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

/// The listing of every live project, in creation order.
#[derive(Debug)]
pub struct ProjectDirectory {
    /// Aggregate identifier.
    pub id: Uuid,
    pub(crate) version: i64,
    /// Listed projects, oldest first.
    pub project_ids: Vec<Uuid>,
    uncommitted_events: Vec<DirectoryEvent>,
}

impl ProjectDirectory {
    /// Creates an empty directory for reconstitution.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            project_ids: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        kind: DirectoryEventKind,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) {
        let event = DirectoryEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                recorded_by: recorded_by.to_owned(),
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Adds `project_id`. Returns `false` when it is already listed.
    pub fn list(
        &mut self,
        project_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> bool {
        if self.project_ids.contains(&project_id) {
            return false;
        }
        self.record(
            DirectoryEventKind::ProjectListed(ProjectListed { project_id }),
            correlation_id,
            recorded_by,
            clock,
        );
        true
    }

    /// Removes `project_id`. Returns `false` when it was not listed.
    pub fn unlist(
        &mut self,
        project_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> bool {
        if !self.project_ids.contains(&project_id) {
            return false;
        }
        self.record(
            DirectoryEventKind::ProjectUnlisted(ProjectUnlisted { project_id }),
            correlation_id,
            recorded_by,
            clock,
        );
        true
    }
}

impl AggregateRoot for ProjectDirectory {
    type Event = DirectoryEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            DirectoryEventKind::ProjectListed(payload) => {
                self.project_ids.push(payload.project_id);
            }
            DirectoryEventKind::ProjectUnlisted(payload) => {
                self.project_ids.retain(|id| *id != payload.project_id);
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
