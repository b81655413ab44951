use std::collections::HashMap;

use iced::widget::{button, canvas, column, container, image, row, scrollable, text, Column, Row};
use iced::{Alignment, ContentFit, Element, Length, Task, Theme};
use rfd::FileDialog;
use tracing::{error, info, warn};

use collage_studio::client::{preview_url, CollageClient};
use collage_studio::config::Config;
use collage_studio::layout::{LayoutRegistry, SectionKey};
use collage_studio::logging;
use collage_studio::state::data::IMAGE_EXTENSIONS;
use collage_studio::state::{AssignmentTracker, SelectedImage};
use collage_studio::store::AssetDescriptor;
use collage_studio::ui::canvas::{LayoutCanvas, PREVIEW_SCALE};
use collage_studio::ui::{discard_drafts, section_previews, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Layouts,
    Gallery,
}

/// Main application state
struct CollageStudio {
    /// One form per catalog layout, in catalog order
    trackers: Vec<AssignmentTracker>,
    /// `None` when the configured server URL is unusable
    client: Option<CollageClient>,
    page: Page,
    gallery: Vec<AssetDescriptor>,
    gallery_loading: bool,
    /// Decoded gallery thumbnails by public id
    previews: HashMap<String, image::Handle>,
    /// Status message to display to the user
    status: String,
}

impl CollageStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::load().unwrap_or_else(|err| {
            warn!(%err, "falling back to default configuration");
            Config::default()
        });

        let registry = LayoutRegistry::builtin();
        let trackers = registry.iter().copied().map(AssignmentTracker::new).collect();

        let (client, status) = match CollageClient::new(&config.client.server_url) {
            Ok(client) => (
                Some(client),
                "Identify a desired layout below, select your images and click on upload".to_string(),
            ),
            Err(err) => {
                error!(%err, "cannot talk to the collage server");
                (None, format!("⚠️  {err}"))
            }
        };

        info!(layouts = registry.len(), server = %config.client.server_url, "🎨 Collage Studio initialized");

        (
            CollageStudio {
                trackers,
                client,
                page: Page::Layouts,
                gallery: Vec::new(),
                gallery_loading: false,
                previews: HashMap::new(),
                status,
            },
            Task::none(),
        )
    }

    fn tracker_mut(&mut self, layout_id: u32) -> Option<&mut AssignmentTracker> {
        self.trackers.iter_mut().find(|tracker| tracker.layout().id == layout_id)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage(key) => {
                // Show the native file picker, limited to images
                let picked = FileDialog::new()
                    .set_title("Select Image")
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file();

                if let Some(path) = picked {
                    self.status = match self.assign(key, path) {
                        Ok(file_name) => format!("{file_name} → {key}"),
                        Err(err) => {
                            warn!(%key, %err, "could not assign image");
                            format!("⚠️  {err}")
                        }
                    };
                }

                Task::none()
            }
            Message::Submit(layout_id) => {
                let Some(client) = self.client.clone() else {
                    self.status = "⚠️  No collage server configured".to_string();
                    return Task::none();
                };
                let Some(tracker) = self.tracker_mut(layout_id) else {
                    return Task::none();
                };

                match tracker.begin_submission() {
                    Ok(submission) => {
                        self.status = "Uploading ...".to_string();
                        Task::perform(
                            async move { client.submit(&submission).await.map_err(|err| err.to_string()) },
                            move |result| Message::SubmitFinished(layout_id, result),
                        )
                    }
                    Err(err) => {
                        self.status = format!("⚠️  {err}");
                        Task::none()
                    }
                }
            }
            Message::SubmitFinished(layout_id, result) => {
                let succeeded = result.is_ok();
                if let Some(tracker) = self.tracker_mut(layout_id) {
                    tracker.finish_submission(succeeded);
                }

                match result {
                    Ok(collage) => {
                        info!(id = %collage.public_id, "✅ collage created");
                        self.status = format!("✅ Collage created: {}", collage.href().unwrap_or(collage.id()));
                        self.show_gallery()
                    }
                    Err(err) => {
                        // The form stays populated for a retry
                        error!(layout_id, %err, "collage upload failed");
                        self.status = format!("⚠️  Upload failed: {err}");
                        Task::none()
                    }
                }
            }
            Message::ShowGallery => self.show_gallery(),
            Message::ShowLayouts => {
                self.page = Page::Layouts;
                Task::none()
            }
            Message::GalleryLoaded(result) => {
                self.gallery_loading = false;
                match result {
                    Ok(gallery) => {
                        self.gallery = gallery;
                        return self.load_previews();
                    }
                    Err(err) => {
                        error!(%err, "failed to load gallery");
                        self.status = format!("⚠️  Could not load gallery: {err}");
                    }
                }
                Task::none()
            }
            Message::PreviewLoaded(id, result) => {
                match result {
                    Ok(bytes) => {
                        self.previews.insert(id, image::Handle::from_bytes(bytes));
                    }
                    Err(err) => warn!(%id, %err, "no preview for collage"),
                }
                Task::none()
            }
        }
    }

    fn assign(&mut self, key: SectionKey, path: std::path::PathBuf) -> collage_studio::Result<String> {
        let image = SelectedImage::from_path(path)?;
        let file_name = image.file_name.clone();
        let tracker = self
            .tracker_mut(key.layout_id)
            .ok_or(collage_studio::CollageError::UnknownLayout(key.layout_id))?;
        let replaced = tracker.is_assigned(key);
        tracker.assign(key, image)?;
        Ok(if replaced { format!("{file_name} (replaced)") } else { file_name })
    }

    /// Fetch thumbnails for gallery entries that have none yet
    fn load_previews(&self) -> Task<Message> {
        let Some(client) = self.client.clone() else {
            return Task::none();
        };

        let downloads = self
            .gallery
            .iter()
            .filter(|collage| !self.previews.contains_key(collage.id()))
            .filter_map(|collage| {
                let url = preview_url(collage)?.to_string();
                let id = collage.id().to_string();
                let client = client.clone();
                Some(Task::perform(
                    async move { client.download(&url).await.map_err(|err| err.to_string()) },
                    move |result| Message::PreviewLoaded(id.clone(), result),
                ))
            });

        Task::batch(downloads)
    }

    fn show_gallery(&mut self) -> Task<Message> {
        if self.page == Page::Layouts {
            discard_drafts(&mut self.trackers);
        }
        self.page = Page::Gallery;

        let Some(client) = self.client.clone() else {
            return Task::none();
        };
        self.gallery_loading = true;
        Task::perform(
            async move { client.gallery().await.map_err(|err| err.to_string()) },
            Message::GalleryLoaded,
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let navigation = row![
            button("Layouts").on_press(Message::ShowLayouts).padding(10),
            button("Gallery").on_press(Message::ShowGallery).padding(10),
        ]
        .spacing(10);

        let page = match self.page {
            Page::Layouts => self.layouts_view(),
            Page::Gallery => self.gallery_view(),
        };

        let content = column![
            text("Photo collages").size(36),
            navigation,
            text(&self.status).size(16),
            scrollable(page).height(Length::Fill),
        ]
        .spacing(20)
        .padding(20)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn layouts_view(&self) -> Element<Message> {
        let mut layouts = Column::new().spacing(50).align_x(Alignment::Center);

        for tracker in &self.trackers {
            let layout = tracker.layout();
            let preview = canvas(LayoutCanvas::new(tracker))
                .width(Length::Fixed(layout.width as f32 * PREVIEW_SCALE))
                .height(Length::Fixed(layout.height as f32 * PREVIEW_SCALE));

            let label = if tracker.in_flight() { "Uploading ..." } else { "Upload" };
            let upload = button(label)
                .padding(10)
                .on_press_maybe(tracker.can_submit().then_some(Message::Submit(layout.id)));

            let thumbnails = section_previews(tracker)
                .into_iter()
                .fold(Row::new().spacing(10), |strip, (_, path)| {
                    strip.push(
                        image(image::Handle::from_path(path))
                            .width(Length::Fixed(96.0))
                            .height(Length::Fixed(96.0))
                            .content_fit(ContentFit::Cover),
                    )
                });

            layouts = layouts.push(
                column![text(layout.name).size(20), preview, thumbnails, upload]
                    .spacing(20)
                    .align_x(Alignment::Center),
            );
        }

        layouts.into()
    }

    fn gallery_view(&self) -> Element<Message> {
        if self.gallery_loading {
            return text("Loading ...").into();
        }
        if self.gallery.is_empty() {
            return text("No collages yet").into();
        }

        let mut list = Column::new().spacing(10);
        for collage in &self.gallery {
            let size = match (collage.width, collage.height) {
                (Some(width), Some(height)) => format!("{width}×{height}"),
                _ => String::new(),
            };
            let mut entry = Row::new().spacing(20).align_y(Alignment::Center);
            if let Some(handle) = self.previews.get(collage.id()) {
                entry = entry.push(image(handle.clone()).width(Length::Fixed(240.0)));
            }
            list = list.push(
                entry
                    .push(text(collage.href().unwrap_or(collage.id()).to_string()))
                    .push(text(size).size(14)),
            );
        }
        list.into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    logging::init(logging::DEFAULT_DIRECTIVES);

    iced::application("Collage Studio", CollageStudio::update, CollageStudio::view)
        .theme(CollageStudio::theme)
        .centered()
        .run_with(CollageStudio::new)
}
