//! Aggregate roots for the Script context.

use chrono::{DateTime, Utc};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::stream::ProjectStream;
use tracing::warn;
use uuid::Uuid;

use super::events::{
    ImportedSection, ScriptCleared, ScriptEvent, ScriptEventKind, SectionContentReplaced,
    SectionDeleted, SectionInserted, SectionUpdated, SectionsImported, SectionsReordered,
};
use super::import::IMPORT_BATCH_SIZE;

/// One block of the script. Its order index is its position in
/// [`Script::sections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section identifier.
    pub id: Uuid,
    /// Body text.
    pub content: String,
    /// Guidance for image contributors.
    pub image_instruction: String,
    /// Reference image URLs as stored (a JSON array), if ever set.
    pub reference_image_urls: Option<String>,
    /// Whether images may be submitted for this section.
    pub allow_image_submission: bool,
    /// When the section was created.
    pub created_at: DateTime<Utc>,
    /// When the section last changed.
    pub updated_at: DateTime<Utc>,
}

impl Section {
    fn new(id: Uuid, content: String, at: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            image_instruction: String::new(),
            reference_image_urls: None,
            allow_image_submission: true,
            created_at: at,
            updated_at: at,
        }
    }

    /// Parses the stored reference URLs. A malformed value reads as an
    /// empty list rather than failing the read.
    #[must_use]
    pub fn parsed_reference_image_urls(&self) -> Option<Vec<String>> {
        let raw = self.reference_image_urls.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(urls) => Some(urls),
            Err(e) => {
                warn!(section_id = %self.id, error = %e, "unreadable reference image urls");
                Some(Vec::new())
            }
        }
    }
}

/// Fields of a partial section edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionChanges {
    /// New body text.
    pub content: Option<String>,
    /// New image instruction.
    pub image_instruction: Option<String>,
    /// New submission flag.
    pub allow_image_submission: Option<bool>,
    /// New reference image URLs.
    pub reference_image_urls: Option<Vec<String>>,
}

impl SectionChanges {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The ordered section sequence of one project.
#[derive(Debug)]
pub struct Script {
    /// Stream identifier, derived from the project id.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Sections in order.
    pub sections: Vec<Section>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ScriptEvent>,
}

impl Script {
    /// Creates an empty script for `project_id`.
    #[must_use]
    pub fn new(project_id: Uuid) -> Self {
        Self {
            id: ProjectStream::Script.id_for(project_id),
            project_id,
            version: 0,
            sections: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Position of a section, if present.
    #[must_use]
    pub fn position_of(&self, section_id: Uuid) -> Option<usize> {
        self.sections.iter().position(|s| s.id == section_id)
    }

    /// Looks a section up by id.
    #[must_use]
    pub fn section(&self, section_id: Uuid) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    fn require_position(&self, section_id: Uuid) -> Result<usize, DomainError> {
        self.position_of(section_id)
            .ok_or_else(|| DomainError::not_found("section", section_id))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        kind: ScriptEventKind,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) {
        let event = ScriptEvent {
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

    /// Replaces every section with `blocks`. Produces one `ScriptCleared`
    /// event followed by one `SectionsImported` event per batch. Returns the
    /// number of sections created.
    pub fn import(
        &mut self,
        blocks: Vec<String>,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> usize {
        let count = blocks.len();
        self.record(
            ScriptEventKind::ScriptCleared(ScriptCleared {
                project_id: self.project_id,
            }),
            correlation_id,
            recorded_by,
            clock,
        );

        let mut blocks = blocks.into_iter().peekable();
        let mut start_index = 0;
        while blocks.peek().is_some() {
            let sections: Vec<ImportedSection> = blocks
                .by_ref()
                .take(IMPORT_BATCH_SIZE)
                .map(|content| ImportedSection {
                    section_id: Uuid::new_v4(),
                    content,
                })
                .collect();
            let batch_len = sections.len();
            self.record(
                ScriptEventKind::SectionsImported(SectionsImported {
                    project_id: self.project_id,
                    start_index,
                    sections,
                }),
                correlation_id,
                recorded_by,
                clock,
            );
            start_index += batch_len;
        }
        count
    }

    /// Inserts a section at `index`, shifting the sections at and after it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `index` is past the end or the
    /// id is already taken.
    pub fn insert_section(
        &mut self,
        section_id: Uuid,
        index: usize,
        content: String,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if index > self.sections.len() {
            return Err(DomainError::Validation(format!(
                "index {index} is out of range for {} sections",
                self.sections.len()
            )));
        }
        if self.position_of(section_id).is_some() {
            return Err(DomainError::Validation(format!(
                "section {section_id} already exists"
            )));
        }
        self.record(
            ScriptEventKind::SectionInserted(SectionInserted {
                project_id: self.project_id,
                section_id,
                index,
                content,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(())
    }

    /// Deletes a section, shifting the following sections back. Returns the
    /// index it held.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown section.
    pub fn delete_section(
        &mut self,
        section_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<usize, DomainError> {
        let index = self.require_position(section_id)?;
        self.record(
            ScriptEventKind::SectionDeleted(SectionDeleted {
                project_id: self.project_id,
                section_id,
                index,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(index)
    }

    /// Writes the provided fields of a section. Returns `false`, with no
    /// event, when nothing was provided.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown section.
    pub fn update_section(
        &mut self,
        section_id: Uuid,
        changes: SectionChanges,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.require_position(section_id)?;
        if changes.is_empty() {
            return Ok(false);
        }
        let reference_image_urls = changes.reference_image_urls.map(|urls| {
            serde_json::to_string(&urls).expect("string list serialization is infallible")
        });
        self.record(
            ScriptEventKind::SectionUpdated(SectionUpdated {
                project_id: self.project_id,
                section_id,
                content: changes.content,
                image_instruction: changes.image_instruction,
                allow_image_submission: changes.allow_image_submission,
                reference_image_urls,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(true)
    }

    /// Overwrites a section's content with an approved proposal's text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown section.
    pub fn replace_content(
        &mut self,
        section_id: Uuid,
        proposal_id: Uuid,
        content: String,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_position(section_id)?;
        self.record(
            ScriptEventKind::SectionContentReplaced(SectionContentReplaced {
                project_id: self.project_id,
                section_id,
                proposal_id,
                content,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(())
    }

    /// Puts the sections in the order of `section_ids`. Returns `false`,
    /// with no event, when the order is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `section_ids` is a
    /// permutation of the current ids.
    pub fn reorder(
        &mut self,
        section_ids: Vec<Uuid>,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        let mut requested = section_ids.clone();
        requested.sort_unstable();
        requested.dedup();
        let mut current: Vec<Uuid> = self.sections.iter().map(|s| s.id).collect();
        let unchanged = current == section_ids;
        current.sort_unstable();
        if requested.len() != section_ids.len() || requested != current {
            return Err(DomainError::Validation(
                "reorder must list every section exactly once".to_owned(),
            ));
        }
        if unchanged {
            return Ok(false);
        }
        self.record(
            ScriptEventKind::SectionsReordered(SectionsReordered {
                project_id: self.project_id,
                section_ids,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(true)
    }

    fn section_mut(&mut self, section_id: Uuid) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }
}

impl AggregateRoot for Script {
    type Event = ScriptEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        let at = event.metadata.occurred_at;
        match &event.kind {
            ScriptEventKind::ScriptCleared(_) => {
                self.sections.clear();
            }
            ScriptEventKind::SectionsImported(payload) => {
                self.sections.extend(
                    payload
                        .sections
                        .iter()
                        .map(|s| Section::new(s.section_id, s.content.clone(), at)),
                );
            }
            ScriptEventKind::SectionInserted(payload) => {
                let index = payload.index.min(self.sections.len());
                self.sections.insert(
                    index,
                    Section::new(payload.section_id, payload.content.clone(), at),
                );
            }
            ScriptEventKind::SectionDeleted(payload) => {
                self.sections.retain(|s| s.id != payload.section_id);
            }
            ScriptEventKind::SectionUpdated(payload) => {
                if let Some(section) = self.section_mut(payload.section_id) {
                    if let Some(content) = &payload.content {
                        section.content.clone_from(content);
                    }
                    if let Some(instruction) = &payload.image_instruction {
                        section.image_instruction.clone_from(instruction);
                    }
                    if let Some(allow) = payload.allow_image_submission {
                        section.allow_image_submission = allow;
                    }
                    if let Some(urls) = &payload.reference_image_urls {
                        section.reference_image_urls = Some(urls.clone());
                    }
                    section.updated_at = at;
                }
            }
            ScriptEventKind::SectionContentReplaced(payload) => {
                if let Some(section) = self.section_mut(payload.section_id) {
                    section.content.clone_from(&payload.content);
                    section.updated_at = at;
                }
            }
            ScriptEventKind::SectionsReordered(payload) => {
                let mut reordered = Vec::with_capacity(self.sections.len());
                for id in &payload.section_ids {
                    if let Some(pos) = self.position_of(*id) {
                        reordered.push(self.sections.remove(pos));
                    }
                }
                // Anything the event did not mention keeps its relative order.
                reordered.append(&mut self.sections);
                self.sections = reordered;
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
