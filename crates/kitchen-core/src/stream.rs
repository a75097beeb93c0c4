//! Per-project stream identifiers.
//!
//! A project owns several event streams besides its own. Their ids are
//! derived from the project id so every handler can locate them without a
//! lookup table.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// The project-scoped streams other than the project stream itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStream {
    /// The ordered section sequence.
    Script,
    /// All proposals of the project.
    ProposalBoard,
    /// All submitted images of the project.
    ImagePool,
}

impl ProjectStream {
    fn label(self) -> &'static [u8] {
        match self {
            Self::Script => b"kitchen.script",
            Self::ProposalBoard => b"kitchen.proposal_board",
            Self::ImagePool => b"kitchen.image_pool",
        }
    }

    /// Derives the stream id for `project_id`.
    #[must_use]
    pub fn id_for(self, project_id: Uuid) -> Uuid {
        let digest = Sha256::new()
            .chain_update(project_id.as_bytes())
            .chain_update(self.label())
            .finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes)
    }
}

/// The single stream listing every project, newest last.
#[must_use]
pub fn project_directory_id() -> Uuid {
    let digest = Sha256::digest(b"kitchen.project_directory");
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_ids_are_stable_and_distinct() {
        let project_id = Uuid::new_v4();

        let script = ProjectStream::Script.id_for(project_id);
        let board = ProjectStream::ProposalBoard.id_for(project_id);
        let pool = ProjectStream::ImagePool.id_for(project_id);

        assert_eq!(script, ProjectStream::Script.id_for(project_id));
        assert_ne!(script, board);
        assert_ne!(board, pool);
        assert_ne!(script, project_id);
    }

    #[test]
    fn test_stream_ids_differ_per_project() {
        let a = ProjectStream::Script.id_for(Uuid::new_v4());
        let b = ProjectStream::Script.id_for(Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn test_directory_id_is_fixed_and_not_a_project_stream() {
        let project_id = Uuid::new_v4();

        assert_eq!(project_directory_id(), project_directory_id());
        assert_ne!(project_directory_id(), ProjectStream::Script.id_for(project_id));
        assert!(!project_directory_id().is_nil());
    }
}
