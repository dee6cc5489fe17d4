use iced::futures::stream::{self, FuturesUnordered, StreamExt};
use iced::task;
use iced::widget::image::Handle;
use iced::widget::{
    button, canvas, container, row, scrollable, stack, text, Column, Image, Row, Space,
};
use iced::{window, Alignment, ContentFit, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod backend;
mod catalog;
mod config;
mod error;
mod pipeline;
mod state;
mod ui;

use backend::frames::spawn_spin;
use backend::types::{BackendMessage, LoadRequest, SaveRequest, Shape, ViewConfig, WorldSize};
use backend::{BackendClient, BackendProcess};
use config::Settings;
use error::Error;
use pipeline::Preview;
use state::forms::{Argb, GenerationForm, NewViewForm, OperationForm, OperationRequest};
use state::frames::FrameCache;
use state::viewer::ViewerInput;
use state::workspace::PIPELINE_VIEW;
use state::workspace::Workspace;
use ui::canvas::ViewerCanvas;
use ui::forms;

/// Task outcomes travel in messages, which must be `Clone`
type Outcome<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    File,
    Edit,
    View,
}

/// Edit operations without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Erosion,
    Noise,
    TranslationNoise,
    Smooth,
}

impl EditOp {
    fn label(self) -> &'static str {
        match self {
            EditOp::Erosion => "Add Erosion",
            EditOp::Noise => "Add Noise",
            EditOp::TranslationNoise => "Add Translation Noise",
            EditOp::Smooth => "Smooth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourField {
    Land,
    Water,
    Contour,
    Parallels,
}

impl ColourField {
    const ALL: [ColourField; 4] = [
        ColourField::Land,
        ColourField::Water,
        ColourField::Contour,
        ColourField::Parallels,
    ];

    fn label(self) -> &'static str {
        match self {
            ColourField::Land => "Land Color",
            ColourField::Water => "Water Color",
            ColourField::Contour => "Contour Color",
            ColourField::Parallels => "Parallels Color",
        }
    }

    fn slot(self, form: &mut NewViewForm) -> &mut Argb {
        match self {
            ColourField::Land => &mut form.land_color,
            ColourField::Water => &mut form.water_color,
            ColourField::Contour => &mut form.contour_color,
            ColourField::Parallels => &mut form.parallels_color,
        }
    }
}

/// Form shown in place of the viewer
#[derive(Debug, Clone)]
enum Dialog {
    NewWorld,
    NewView,
    Operation(OperationForm),
}

/// Main application state
struct MapMaker {
    settings: Settings,
    client: BackendClient,
    /// Killed when dropped
    backend: Option<BackendProcess>,
    workspace: Workspace,
    open_menu: Option<Menu>,
    dialog: Option<Dialog>,
    generation: GenerationForm,
    view_form: NewViewForm,
    /// What the user typed in each colour field, parsed or not
    colour_text: [String; 4],
    /// Preview stream of the running generation, with the tab it feeds
    pipeline_watch: Option<(u64, task::Handle)>,
    /// Failed frame fetches per (tab, view) since the view was requested
    fetch_failures: HashMap<(u64, String), usize>,
    /// Image currently on screen, already cropped to the zoom window
    display: Option<Handle>,
    status: String,
    /// Size and layers of the backend's world, once known
    world_info: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ToggleMenu(Menu),
    NewWorld,
    OpenWorld,
    SaveWorld,
    Edit(EditOp),
    OpenOperation(OperationForm),
    AddView,
    OpenViewDirectory,
    RefreshView,

    CancelDialog,
    GenerationChanged(GenerationForm),
    SubmitGeneration,
    ViewFormChanged(NewViewForm),
    ColourChanged(ColourField, String),
    ToggleLayer(&'static str, bool),
    SubmitView,
    OperationField(usize, f32),
    SubmitOperation,

    SelectTab(usize),
    CloseTab(usize),
    SelectView(String),
    CloseView(String),
    Viewer {
        input: ViewerInput,
        width: f64,
        height: f64,
    },

    PipelinePreview {
        tab: u64,
        preview: Preview,
    },
    Generated {
        tab: u64,
        result: Outcome<BackendMessage>,
    },
    WorldLoaded {
        tab: u64,
        result: Outcome<BackendMessage>,
    },
    WorldInfo(Outcome<(WorldSize, Vec<String>)>),
    Saved(Outcome<BackendMessage>),
    Edited {
        label: &'static str,
        result: Outcome<BackendMessage>,
    },
    FrameFetched {
        tab: u64,
        view: String,
        result: Outcome<f64>,
    },
    /// Every frame of a view has been fetched or loaded
    ViewReady {
        tab: u64,
        view: String,
        result: Outcome<()>,
    },
    CloseRequested(window::Id),
}

impl MapMaker {
    fn new(settings: Settings, client: BackendClient) -> (Self, Task<Message>) {
        let mut status = format!("Ready. Backend at {}", settings.backend_address);
        let backend = match &settings.backend_command {
            Some(path) => match BackendProcess::spawn(path) {
                Ok(process) => Some(process),
                Err(e) => {
                    log::warn!("⚠️  {}", e);
                    status = format!("⚠️  {}. Start the backend manually.", e);
                    None
                }
            },
            None => None,
        };

        let view_form = NewViewForm::default();
        let colour_text = ColourField::ALL.map(|field| {
            let mut form = view_form.clone();
            field.slot(&mut form).to_hex()
        });

        (
            MapMaker {
                settings,
                client,
                backend,
                workspace: Workspace::new(),
                open_menu: None,
                dialog: None,
                generation: GenerationForm::default(),
                view_form,
                colour_text,
                pipeline_watch: None,
                fetch_failures: HashMap::new(),
                display: None,
                status,
                world_info: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleMenu(menu) => {
                self.open_menu = if self.open_menu == Some(menu) {
                    None
                } else {
                    Some(menu)
                };
                Task::none()
            }
            Message::NewWorld => {
                self.open_menu = None;
                self.dialog = Some(Dialog::NewWorld);
                Task::none()
            }
            Message::OpenWorld => {
                self.open_menu = None;
                self.open_world()
            }
            Message::SaveWorld => {
                self.open_menu = None;
                self.save_world()
            }
            Message::Edit(op) => {
                self.open_menu = None;
                self.run_edit(op)
            }
            Message::OpenOperation(form) => {
                self.open_menu = None;
                if self.require_world() {
                    self.dialog = Some(Dialog::Operation(form));
                }
                Task::none()
            }
            Message::AddView => {
                self.open_menu = None;
                if self.require_world() {
                    self.dialog = Some(Dialog::NewView);
                }
                Task::none()
            }
            Message::OpenViewDirectory => {
                self.open_menu = None;
                self.open_view_directory()
            }
            Message::RefreshView => {
                self.open_menu = None;
                self.refresh_view()
            }

            Message::CancelDialog => {
                self.dialog = None;
                Task::none()
            }
            Message::GenerationChanged(form) => {
                self.generation = form;
                Task::none()
            }
            Message::SubmitGeneration => {
                self.dialog = None;
                self.generate()
            }
            Message::ViewFormChanged(form) => {
                self.view_form = form;
                Task::none()
            }
            Message::ColourChanged(field, value) => {
                let parsed = if value.trim().is_empty() {
                    Some(Argb::TRANSPARENT)
                } else {
                    Argb::parse(&value)
                };
                if let Some(colour) = parsed {
                    *field.slot(&mut self.view_form) = colour;
                }
                self.colour_text[field as usize] = value;
                Task::none()
            }
            Message::ToggleLayer(layer, enabled) => {
                self.view_form.toggle_layer(layer, enabled);
                Task::none()
            }
            Message::SubmitView => {
                self.dialog = None;
                self.add_view()
            }
            Message::OperationField(index, value) => {
                if let Some(Dialog::Operation(form)) = &mut self.dialog {
                    form.set_field(index, value);
                }
                Task::none()
            }
            Message::SubmitOperation => match self.dialog.take() {
                Some(Dialog::Operation(form)) => self.run_operation(form),
                other => {
                    self.dialog = other;
                    Task::none()
                }
            },

            Message::SelectTab(index) => {
                self.workspace.select_tab(index);
                self.refresh_display();
                Task::none()
            }
            Message::CloseTab(index) => {
                if let Some(tab) = self.workspace.close_tab(index) {
                    log::info!("🗑️  Closed world {}", tab.name);
                }
                self.refresh_display();
                Task::none()
            }
            Message::SelectView(view) => {
                if let Some(tab) = self.workspace.active_mut() {
                    let frame = tab.view(&view).map(|cache| cache.nearest(tab.viewer.longitude));
                    if let Some(frame) = frame {
                        let size = (frame.width(), frame.height());
                        tab.viewer.select_view(&view, !frame.is_empty(), size);
                    }
                }
                self.refresh_display();
                Task::none()
            }
            Message::CloseView(view) => {
                if let Some(tab) = self.workspace.active_mut() {
                    tab.close_view(&view);
                }
                self.refresh_display();
                Task::none()
            }
            Message::Viewer {
                input,
                width,
                height,
            } => {
                let Some(tab) = self.workspace.active_mut() else {
                    return Task::none();
                };
                let size = tab
                    .current_cache()
                    .map(|cache| {
                        let frame = cache.nearest(tab.viewer.longitude);
                        (frame.width(), frame.height())
                    })
                    .unwrap_or((0, 0));
                tab.viewer.handle(ViewerInput::Resize { width, height }, size);
                let moves_view =
                    !matches!(input, ViewerInput::Move { .. }) || tab.viewer.is_dragging();
                tab.viewer.handle(input, size);
                if moves_view {
                    self.refresh_display();
                }
                Task::none()
            }

            Message::PipelinePreview { tab, preview } => {
                log::debug!("🖼️  Pipeline stage {}", preview.path.display());
                let cache = self
                    .workspace
                    .tab_mut(tab)
                    .and_then(|t| t.view(PIPELINE_VIEW).cloned());
                if let Some(cache) = cache {
                    cache.insert(0.0, preview.frame);
                    self.frame_landed(tab, PIPELINE_VIEW);
                }
                Task::none()
            }
            Message::Generated { tab, result } => {
                // a newer generation may own the watch by now
                if matches!(self.pipeline_watch, Some((watched, _)) if watched == tab) {
                    if let Some((_, handle)) = self.pipeline_watch.take() {
                        handle.abort();
                    }
                }
                self.world_ready(tab, result, "Generation failed")
            }
            Message::WorldLoaded { tab, result } => {
                self.world_ready(tab, result, "Loading failed")
            }
            Message::WorldInfo(result) => {
                match result {
                    Ok((size, layers)) => {
                        log::info!(
                            "🌍 World is {}x{}, layers: {}",
                            size.width,
                            size.height,
                            layers.join(", ")
                        );
                        self.world_info = Some(format!(
                            "{}x{} | {}",
                            size.width,
                            size.height,
                            layers.join(", ")
                        ));
                    }
                    Err(e) => log::warn!("⚠️  Could not describe world: {}", e),
                }
                Task::none()
            }
            Message::Saved(result) => {
                match result {
                    Ok(reply) => {
                        log::info!("💾 {}", reply.message);
                        self.status = format!("💾 {}", reply.message);
                    }
                    Err(e) => self.fail("Saving failed", e),
                }
                Task::none()
            }
            Message::Edited { label, result } => match result {
                Ok(reply) => {
                    log::info!("✅ {}: {}", label, reply.message);
                    self.status = format!("✅ {}: {}", label, reply.message);
                    Task::batch([self.refresh_view(), self.describe_world()])
                }
                Err(e) => {
                    self.fail(label, e);
                    Task::none()
                }
            },
            Message::FrameFetched { tab, view, result } => {
                match result {
                    Ok(_) => self.frame_landed(tab, &view),
                    Err(e) => {
                        log::debug!("Frame of {} failed: {}", view, e);
                        *self.fetch_failures.entry((tab, view)).or_default() += 1;
                    }
                }
                Task::none()
            }
            Message::ViewReady { tab, view, result } => {
                let failed = self
                    .fetch_failures
                    .remove(&(tab, view.clone()))
                    .unwrap_or(0);
                match result {
                    Ok(()) => {
                        let count = self
                            .workspace
                            .tab_mut(tab)
                            .and_then(|t| t.view(&view).map(|cache| cache.len()))
                            .unwrap_or(0);
                        let failures = match failed {
                            0 => String::new(),
                            n => format!(", {} failed", n),
                        };
                        if count == 0 {
                            self.status = format!("⚠️  View {} has no frames{}", view, failures);
                        } else {
                            self.status =
                                format!("✅ View {} ready ({} frames{})", view, count, failures);
                            self.frame_landed(tab, &view);
                        }
                    }
                    Err(e) => self.fail(&format!("View {}", view), e),
                }
                Task::none()
            }
            Message::CloseRequested(id) => {
                if let Some((_, handle)) = self.pipeline_watch.take() {
                    handle.abort();
                }
                // dropping the process handle kills the backend
                self.backend = None;
                window::close(id)
            }
        }
    }

    /// A world finished generating or loading into tab `tab`
    fn world_ready(
        &mut self,
        tab: u64,
        result: Outcome<BackendMessage>,
        failure: &str,
    ) -> Task<Message> {
        match result {
            Ok(reply) => {
                log::info!("✅ {}", reply.message);
                self.status = format!("✅ {}", reply.message);
                if self.workspace.tab_mut(tab).is_some() {
                    self.dialog = Some(Dialog::NewView);
                }
                self.describe_world()
            }
            Err(e) => {
                self.fail(failure, e);
                Task::none()
            }
        }
    }

    /// Ask the backend for the size and layers of its current world
    fn describe_world(&self) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move {
                let size = client.get_size().await?;
                let layers = client.get_layers().await?;
                Ok::<_, Error>((size, layers))
            },
            |result| Message::WorldInfo(result.map_err(|e| e.to_string())),
        )
    }

    fn fail(&mut self, what: &str, error: String) {
        log::error!("❌ {}: {}", what, error);
        self.status = format!("❌ {}: {}", what, error);
    }

    fn require_world(&mut self) -> bool {
        if self.workspace.is_empty() {
            self.status = String::from("Create or open a world first.");
            return false;
        }
        true
    }

    /// Start `generate` in a new tab while streaming its pipeline previews
    fn generate(&mut self) -> Task<Message> {
        let config = self.generation.to_config();
        let tab = self.workspace.new_tab(format!("World {}", config.seed));
        let tab_id = tab.id;
        tab.open_view(PIPELINE_VIEW);
        tab.viewer.select_view(PIPELINE_VIEW, false, (0, 0));
        self.display = None;

        let dir = self.settings.pipeline_dir();
        if let Err(e) = pipeline::clear_previews(&dir) {
            log::warn!("⚠️  Could not clear {}: {}", dir.display(), e);
        }
        if let Some((_, handle)) = self.pipeline_watch.take() {
            handle.abort();
        }
        let interval = Duration::from_millis(self.settings.pipeline_poll_ms);
        let (watch, handle) = Task::run(pipeline::watch(dir, interval), move |preview| {
            Message::PipelinePreview {
                tab: tab_id,
                preview,
            }
        })
        .abortable();
        self.pipeline_watch = Some((tab_id, handle));

        log::info!("🌍 Generating world with seed {}", config.seed);
        self.status = format!("⏳ Generating world {}...", config.seed);
        let client = self.client.clone();
        let generate = Task::perform(
            async move { client.generate(&config).await.map_err(|e| e.to_string()) },
            move |result| Message::Generated {
                tab: tab_id,
                result,
            },
        );
        Task::batch([watch, generate])
    }

    /// `.bin` files are saved worlds, `.png` files are height maps
    fn open_world(&mut self) -> Task<Message> {
        let Some(file) = FileDialog::new()
            .set_title("Open World")
            .add_filter("Binaries or images", &["bin", "png"])
            .pick_file()
        else {
            return Task::none();
        };

        let from_image = match file.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => false,
            Some(ext) if ext.eq_ignore_ascii_case("png") => true,
            _ => {
                self.status = format!("Unsupported file {}", file.display());
                return Task::none();
            }
        };
        let name = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("world"));
        let request = LoadRequest {
            world_name: name.clone(),
            file: file.to_string_lossy().into_owned(),
            shape: Shape::Globe,
        };

        let tab_id = self.workspace.new_tab(name.clone()).id;
        self.display = None;
        self.status = format!("⏳ Opening {}...", file.display());
        log::info!("📂 Opening {}", file.display());

        let client = self.client.clone();
        Task::perform(
            async move {
                let reply = if from_image {
                    client.generate_from_image(&request).await
                } else {
                    client.load(&request).await
                };
                reply.map_err(|e| e.to_string())
            },
            move |result| Message::WorldLoaded {
                tab: tab_id,
                result,
            },
        )
    }

    fn save_world(&mut self) -> Task<Message> {
        let Some(world_name) = self.workspace.selected_world().map(str::to_string) else {
            self.status = String::from("No world to save.");
            return Task::none();
        };
        let Some(path) = FileDialog::new()
            .set_title("Save World")
            .add_filter("binary", &["bin"])
            .set_file_name(format!("{}.bin", world_name))
            .save_file()
        else {
            return Task::none();
        };

        let request = SaveRequest {
            world_name,
            path: path.to_string_lossy().into_owned(),
        };
        let client = self.client.clone();
        Task::perform(
            async move { client.save(&request).await.map_err(|e| e.to_string()) },
            Message::Saved,
        )
    }

    fn run_edit(&mut self, op: EditOp) -> Task<Message> {
        if !self.require_world() {
            return Task::none();
        }
        self.status = format!("⏳ {}...", op.label());
        let client = self.client.clone();
        Task::perform(
            async move {
                let reply = match op {
                    EditOp::Erosion => client.erosion().await,
                    EditOp::Noise => client.add_noise().await,
                    EditOp::TranslationNoise => client.translation_noise().await,
                    EditOp::Smooth => client.smooth().await,
                };
                reply.map_err(|e| e.to_string())
            },
            move |result| Message::Edited {
                label: op.label(),
                result,
            },
        )
    }

    fn run_operation(&mut self, form: OperationForm) -> Task<Message> {
        let label = form.title();
        self.status = format!("⏳ {}...", label);
        let client = self.client.clone();
        Task::perform(
            async move {
                let reply = match OperationRequest::from(form) {
                    OperationRequest::WaterLevel(request) => {
                        client.adjust_water_percentage(&request).await
                    }
                    OperationRequest::Resize(request) => client.resize(&request).await,
                    OperationRequest::Climate(request) => client.calculate_climate(&request).await,
                };
                reply.map_err(|e| e.to_string())
            },
            move |result| Message::Edited { label, result },
        )
    }

    /// Create the view from the form and fill it
    fn add_view(&mut self) -> Task<Message> {
        let name = self.view_form.view_name();
        let config = self.view_form.to_config(&self.settings.output_dir);
        let render_to_disk = self.view_form.render_to_disk;
        let Some(tab) = self.workspace.active_mut() else {
            return Task::none();
        };
        let cache = tab.open_view(&name);
        tab.set_view_config(&name, config.clone());
        tab.viewer.select_view(&name, false, (0, 0));
        let tab_id = tab.id;
        self.refresh_display();

        log::info!(
            "🗺️  New view {} ({}, {} frames)",
            name,
            config.projection,
            config.rotation_frames
        );
        self.status = format!("⏳ Rendering view {}...", name);
        if render_to_disk {
            self.render_to_disk(tab_id, name, cache, config)
        } else {
            self.fetch_spin(tab_id, name, cache, config)
        }
    }

    /// One `get_image` per rotation angle, each frame shown as it lands
    fn fetch_spin(
        &mut self,
        tab: u64,
        view: String,
        cache: Arc<FrameCache>,
        config: ViewConfig,
    ) -> Task<Message> {
        self.fetch_failures.remove(&(tab, view.clone()));
        let client = self.client.clone();
        let fetches = stream::once(async move { spawn_spin(&client, &cache, config) })
            .flat_map(|handles| handles.into_iter().collect::<FuturesUnordered<_>>());

        let fetched_view = view.clone();
        Task::run(fetches, move |joined| Message::FrameFetched {
            tab,
            view: fetched_view.clone(),
            result: match joined {
                Ok(Ok(angle)) => Ok(angle),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(e.to_string()),
            },
        })
        .chain(Task::done(Message::ViewReady {
            tab,
            view,
            result: Ok(()),
        }))
    }

    /// `draw` every frame into the view's output directory, then load it
    fn render_to_disk(
        &self,
        tab: u64,
        view: String,
        cache: Arc<FrameCache>,
        config: ViewConfig,
    ) -> Task<Message> {
        let client = self.client.clone();
        let dir = self.settings.view_dir(&view);
        Task::perform(
            async move {
                let result = async {
                    let stale = dir.clone();
                    tokio::task::spawn_blocking(move || pipeline::remove_pngs(&stale))
                        .await
                        .map_err(|e| Error::Task(e.to_string()))??;
                    let reply = client.draw(&config).await?;
                    log::info!("✅ {}", reply.message);
                    let loaded = tokio::task::spawn_blocking(move || {
                        pipeline::load_view_directory(&dir, &cache)
                    })
                    .await
                    .map_err(|e| Error::Task(e.to_string()))??;
                    Ok::<usize, Error>(loaded)
                }
                .await;
                result.map(|_| ()).map_err(|e| e.to_string())
            },
            move |result| Message::ViewReady { tab, view: view.clone(), result },
        )
    }

    /// Load a directory of rendered frames as a new view
    fn open_view_directory(&mut self) -> Task<Message> {
        if !self.require_world() {
            return Task::none();
        }
        let Some(dir) = FileDialog::new()
            .set_title("Open View Directory")
            .set_directory(&self.settings.output_dir)
            .pick_folder()
        else {
            return Task::none();
        };
        self.load_directory_view(dir)
    }

    fn load_directory_view(&mut self, dir: PathBuf) -> Task<Message> {
        let view = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.to_string_lossy().into_owned());
        let Some(tab) = self.workspace.active_mut() else {
            return Task::none();
        };
        let cache = tab.open_view(&view);
        tab.viewer.select_view(&view, false, (0, 0));
        let tab_id = tab.id;

        Task::perform(
            async move {
                let joined =
                    tokio::task::spawn_blocking(move || pipeline::load_view_directory(&dir, &cache))
                        .await;
                match joined {
                    Ok(loaded) => loaded.map(|_| ()).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            },
            move |result| Message::ViewReady {
                tab: tab_id,
                view: view.clone(),
                result,
            },
        )
    }

    /// Refetch the shown view. Old frames stay visible until replaced.
    fn refresh_view(&mut self) -> Task<Message> {
        let Some(tab) = self.workspace.active() else {
            return Task::none();
        };
        let view = tab.viewer.current_view.clone();
        let (Some(cache), Some(config)) = (tab.view(&view).cloned(), tab.view_config(&view).cloned())
        else {
            return Task::none();
        };
        let tab_id = tab.id;
        self.status = format!("⏳ Refreshing view {}...", view);
        self.fetch_spin(tab_id, view, cache, config)
    }

    /// A frame of `view` arrived: finish a pending selection and redraw
    fn frame_landed(&mut self, tab: u64, view: &str) {
        let Some(world) = self.workspace.tab_mut(tab) else {
            return;
        };
        let frame = world
            .view(view)
            .map(|cache| cache.nearest(world.viewer.longitude));
        if let Some(frame) = frame {
            world
                .viewer
                .frame_arrived(view, (frame.width(), frame.height()));
        }
        self.refresh_display();
    }

    /// Rebuild the displayed image from the active tab's viewer state
    fn refresh_display(&mut self) {
        self.display = None;
        let Some(tab) = self.workspace.active_mut() else {
            return;
        };
        let frame = match tab.current_cache() {
            Some(cache) => cache.nearest(tab.viewer.longitude),
            None => return,
        };
        if frame.is_empty() {
            return;
        }
        self.display = match tab.viewer.visible_region((frame.width(), frame.height())) {
            Some(region) => frame.crop(region).handle().cloned(),
            None => frame.handle().cloned(),
        };
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let mut content = Column::new().push(self.menu_bar());
        if let Some(menu) = self.open_menu {
            content = content.push(self.menu_items(menu));
        }

        let body: Element<Message> = match &self.dialog {
            Some(dialog) => scrollable(self.dialog_view(dialog))
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => self.viewer_view(),
        };

        content
            .push(self.tab_bar())
            .push(
                row![self.view_list(), body]
                    .spacing(10)
                    .height(Length::Fill),
            )
            .push(row![
                text(&self.status).size(14),
                Space::with_width(Length::Fill),
                text(self.world_info.as_deref().unwrap_or_default()).size(14),
            ])
            .spacing(8)
            .padding(10)
            .into()
    }

    fn menu_bar(&self) -> Element<Message> {
        let entry = |label: &'static str, menu: Menu| {
            let style = if self.open_menu == Some(menu) {
                button::primary
            } else {
                button::secondary
            };
            button(label).on_press(Message::ToggleMenu(menu)).style(style)
        };
        row![
            entry("File", Menu::File),
            entry("Edit", Menu::Edit),
            entry("View", Menu::View),
        ]
        .spacing(4)
        .into()
    }

    fn menu_items(&self, menu: Menu) -> Element<Message> {
        let items: Vec<(&str, Message)> = match menu {
            Menu::File => vec![
                ("New World", Message::NewWorld),
                ("Open", Message::OpenWorld),
                ("Save", Message::SaveWorld),
            ],
            Menu::Edit => vec![
                (EditOp::Erosion.label(), Message::Edit(EditOp::Erosion)),
                (EditOp::Noise.label(), Message::Edit(EditOp::Noise)),
                (
                    EditOp::TranslationNoise.label(),
                    Message::Edit(EditOp::TranslationNoise),
                ),
                (
                    "Change Sea Level",
                    Message::OpenOperation(OperationForm::water_level()),
                ),
                (EditOp::Smooth.label(), Message::Edit(EditOp::Smooth)),
                ("Resize", Message::OpenOperation(OperationForm::resize())),
                (
                    "Define Climate",
                    Message::OpenOperation(OperationForm::climate()),
                ),
            ],
            Menu::View => vec![
                ("Add View", Message::AddView),
                ("Open View Directory", Message::OpenViewDirectory),
                ("Refresh View", Message::RefreshView),
            ],
        };

        items
            .into_iter()
            .fold(Row::new().spacing(4), |bar, (label, message)| {
                bar.push(button(text(label).size(14)).on_press(message).style(button::text))
            })
            .into()
    }

    fn tab_bar(&self) -> Element<Message> {
        let active = self.workspace.active_index();
        self.workspace
            .tabs()
            .iter()
            .enumerate()
            .fold(Row::new().spacing(6), |bar, (index, tab)| {
                let style = if active == Some(index) {
                    button::primary
                } else {
                    button::secondary
                };
                bar.push(
                    row![
                        button(text(&tab.name)).on_press(Message::SelectTab(index)).style(style),
                        button("×").on_press(Message::CloseTab(index)).style(button::text),
                    ]
                    .align_y(Alignment::Center),
                )
            })
            .into()
    }

    fn view_list(&self) -> Element<Message> {
        let mut list = Column::new().spacing(4).width(Length::Fixed(180.0));
        if let Some(tab) = self.workspace.active() {
            list = list.push(text("Views").size(18));
            for view in tab.view_names().into_iter().filter(|v| !v.is_empty()) {
                let style = if tab.viewer.current_view == view {
                    button::primary
                } else {
                    button::secondary
                };
                list = list.push(
                    row![
                        button(text(view.to_string()))
                            .on_press(Message::SelectView(view.to_string()))
                            .style(style)
                            .width(Length::Fill),
                        button("×")
                            .on_press(Message::CloseView(view.to_string()))
                            .style(button::text),
                    ]
                    .align_y(Alignment::Center),
                );
            }
        }
        list.into()
    }

    fn viewer_view(&self) -> Element<Message> {
        let Some(tab) = self.workspace.active() else {
            return container(text("Create a world with File → New World, or open one."))
                .center(Length::Fill)
                .into();
        };

        let picture: Element<Message> = match &self.display {
            Some(handle) => Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => Space::new(Length::Fill, Length::Fill).into(),
        };
        let overlay = canvas(ViewerCanvas {
            longitude: tab.viewer.longitude,
            zoom: tab.viewer.zoom,
            waiting_for: tab.viewer.pending_view.clone(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        stack![picture, overlay]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn dialog_view(&self, dialog: &Dialog) -> Element<Message> {
        match dialog {
            Dialog::NewWorld => forms::generation_view(&self.generation),
            Dialog::NewView => forms::new_view_view(&self.view_form, &self.colour_text),
            Dialog::Operation(form) => forms::operation_view(form),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(Message::CloseRequested)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().unwrap_or_else(|e| {
        log::error!("❌ {}; using default settings", e);
        Settings::default()
    });
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let client = match BackendClient::new(settings.backend_address.clone(), timeout) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Could not create HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("🎨 Map Maker talking to {}", client.base_url());

    iced::application("Map Maker", MapMaker::update, MapMaker::view)
        .theme(MapMaker::theme)
        .subscription(MapMaker::subscription)
        .exit_on_close_request(false)
        .centered()
        .run_with(move || MapMaker::new(settings, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::frames::Frame;
    use std::path::Path;

    fn test_app(output_dir: &Path) -> MapMaker {
        let settings = Settings {
            backend_command: None,
            output_dir: output_dir.to_path_buf(),
            ..Settings::default()
        };
        let client =
            BackendClient::new(settings.backend_address.clone(), Duration::from_secs(1)).unwrap();
        MapMaker::new(settings, client).0
    }

    #[test]
    fn test_finished_generation_keeps_newer_preview_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        let _ = app.update(Message::SubmitGeneration);
        let first = app.workspace.active().unwrap().id;
        let _ = app.update(Message::SubmitGeneration);
        let second = app.workspace.active().unwrap().id;
        assert_ne!(first, second);

        let _ = app.update(Message::Generated {
            tab: first,
            result: Err(String::from("connection reset")),
        });
        // the newer stream is still held, so it was never aborted
        let (watched, _) = app.pipeline_watch.as_ref().unwrap();
        assert_eq!(*watched, second);

        let _ = app.update(Message::Generated {
            tab: second,
            result: Ok(BackendMessage {
                message: String::from("generated"),
            }),
        });
        assert!(app.pipeline_watch.is_none());
    }

    #[test]
    fn test_view_ready_reports_failed_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let tab = app.workspace.new_tab("earth");
        let tab_id = tab.id;
        let cache = tab.open_view("globe");
        cache.insert(0.0, Frame::default());
        cache.insert(90.0, Frame::default());

        for _ in 0..3 {
            let _ = app.update(Message::FrameFetched {
                tab: tab_id,
                view: String::from("globe"),
                result: Err(String::from("backend returned 500")),
            });
        }
        let _ = app.update(Message::ViewReady {
            tab: tab_id,
            view: String::from("globe"),
            result: Ok(()),
        });
        assert!(app.status.contains("(2 frames, 3 failed)"), "{}", app.status);

        // failures are counted per request, not carried over
        let _ = app.update(Message::ViewReady {
            tab: tab_id,
            view: String::from("globe"),
            result: Ok(()),
        });
        assert!(app.status.contains("(2 frames)"), "{}", app.status);
    }
}
