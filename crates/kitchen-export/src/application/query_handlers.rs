//! Export handlers. Exports read the project; they never write events.

use futures::stream::{self, StreamExt};
use kitchen_core::access::{Actor, Operation};
use kitchen_core::error::DomainError;
use kitchen_core::identity::DisplayNameResolver;
use kitchen_core::repository::EventRepository;
use kitchen_core::storage::ImageFetcher;
use kitchen_curation::application::query_handlers::{SelectedImageView, list_selected};
use kitchen_project::application::query_handlers::authorize_operation;
use kitchen_script::application::query_handlers::list_ordered;
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::{ArchiveEntry, ArchiveWriter};
use crate::domain::bundle::{
    BundleEntry, IMAGES_FOLDER, ImageBundle, ImageFetchFailure, SCRIPT_FILENAME,
};
use crate::domain::naming::{EntryNamer, extension_from_url, image_stem};
use crate::domain::script_text::{render_detailed, render_plain};

/// Image downloads a bundle keeps in flight at once.
pub const FETCH_CONCURRENCY: usize = 8;

/// Collaborators needed to build image bundles.
#[derive(Clone, Copy)]
pub struct BundleSources<'a> {
    /// Event store.
    pub repo: &'a dyn EventRepository,
    /// Uploader display names.
    pub names: &'a dyn DisplayNameResolver,
    /// Image byte source.
    pub fetcher: &'a dyn ImageFetcher,
    /// Archive format.
    pub archive: &'a dyn ArchiveWriter,
}

/// Renders the project's script. With headings, the detailed form carries
/// title, description, section headings and image instructions; without,
/// only the non-blank section bodies remain.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// `DomainError::Unauthorized` when exports are closed for the actor.
pub async fn build_script(
    project_id: Uuid,
    with_headings: bool,
    actor: &Actor,
    repo: &dyn EventRepository,
) -> Result<String, DomainError> {
    let project = authorize_operation(project_id, actor, Operation::Export, repo).await?;
    let sections = list_ordered(project_id, repo).await?;
    Ok(if with_headings {
        render_detailed(&project.title, &project.description, &sections)
    } else {
        render_plain(&sections)
    })
}

/// Names and fetches every selected image, at most [`FETCH_CONCURRENCY`]
/// at a time and in selection order. Names are assigned before fetching so
/// a failure never shifts the names of other images.
async fn collect_images(
    selected: &[SelectedImageView],
    folder: Option<&str>,
    fetcher: &dyn ImageFetcher,
) -> (Vec<ArchiveEntry>, Vec<BundleEntry>, Vec<ImageFetchFailure>) {
    let mut namer = EntryNamer::new();
    let paths: Vec<String> = selected
        .iter()
        .map(|image| {
            let name = namer.unique(
                &image_stem(image.section_index, &image.uploader_name),
                &extension_from_url(&image.image_url),
            );
            match folder {
                Some(folder) => format!("{folder}/{name}"),
                None => name,
            }
        })
        .collect();

    let fetches: Vec<_> = selected
        .iter()
        .map(|image| fetcher.fetch(&image.image_url))
        .collect();
    let fetched: Vec<_> = stream::iter(fetches)
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let mut files = Vec::new();
    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for ((image, path), result) in selected.iter().zip(paths).zip(fetched) {
        match result {
            Ok(bytes) => {
                entries.push(BundleEntry {
                    path: path.clone(),
                    image_id: image.image_id,
                });
                files.push(ArchiveEntry { path, bytes });
            }
            Err(e) => {
                warn!(
                    image_id = %image.image_id,
                    image_url = %image.image_url,
                    error = %e,
                    "skipping image that could not be fetched"
                );
                failures.push(ImageFetchFailure {
                    image_id: image.image_id,
                    image_url: image.image_url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (files, entries, failures)
}

/// Archives every adopted image, named after its section and uploader.
/// Images that cannot be fetched are left out and listed in
/// [`ImageBundle::failures`].
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project,
/// `DomainError::Unauthorized` when exports are closed for the actor, and
/// archive or lookup failures.
pub async fn build_image_bundle(
    project_id: Uuid,
    actor: &Actor,
    sources: BundleSources<'_>,
) -> Result<ImageBundle, DomainError> {
    authorize_operation(project_id, actor, Operation::Export, sources.repo).await?;
    let selected = list_selected(project_id, sources.repo, sources.names).await?;
    let (files, entries, failures) = collect_images(&selected, None, sources.fetcher).await;
    let archive = sources.archive.write_archive(&files)?;

    info!(
        %project_id,
        images = entries.len(),
        skipped = failures.len(),
        "image bundle built"
    );

    Ok(ImageBundle {
        archive,
        entries,
        failures,
    })
}

/// The detailed script as `script.txt` plus every adopted image under
/// `images/`, in one archive.
///
/// # Errors
///
/// Same as [`build_image_bundle`].
pub async fn build_full_bundle(
    project_id: Uuid,
    actor: &Actor,
    sources: BundleSources<'_>,
) -> Result<ImageBundle, DomainError> {
    let script = build_script(project_id, true, actor, sources.repo).await?;
    let selected = list_selected(project_id, sources.repo, sources.names).await?;
    let (images, entries, failures) =
        collect_images(&selected, Some(IMAGES_FOLDER), sources.fetcher).await;

    let mut files = Vec::with_capacity(images.len() + 1);
    files.push(ArchiveEntry {
        path: SCRIPT_FILENAME.to_owned(),
        bytes: script.into_bytes(),
    });
    files.extend(images);
    let archive = sources.archive.write_archive(&files)?;

    info!(
        %project_id,
        images = entries.len(),
        skipped = failures.len(),
        "full bundle built"
    );

    Ok(ImageBundle {
        archive,
        entries,
        failures,
    })
}
