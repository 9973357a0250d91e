use crate::config::{Palette, Settings, ViewConfig};
use crate::dataset::{Dataset, Feature, FeatureId};
use crate::layout::{ControlHit, ScreenLayout};
use crate::loader::LoadResult;
use crate::map::{BaseMap, Viewport};
use crate::symbols::{self, MarkerStyle, MarkerView, SequenceController};
use ratatui::layout::Rect;
use std::path::PathBuf;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{info, warn};

/// Progress of the one dataset load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub basemap: BaseMap,
    /// Symbols and their sequence, once the dataset has arrived
    pub sequence: Option<SequenceController>,
    pub load_state: LoadState,
    pub data_path: PathBuf,
    pub palette: Palette,
    pub should_quit: bool,
    /// Marker under the pointer; its popup is open
    pub hovered: Option<FeatureId>,
    /// Marker last clicked, shown in the inspector
    pub selected: Option<FeatureId>,
    pub show_inspector: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position
    pub mouse_pos: Option<(u16, u16)>,
    /// Dragging started on the slider track
    dragging_slider: bool,
    pending: Option<oneshot::Receiver<LoadResult>>,
    area: Rect,
    home: ViewConfig,
    attribute_marker: String,
    style: MarkerStyle,
}

impl App {
    pub fn new(settings: &Settings, width: u16, height: u16) -> Self {
        let area = Rect::new(0, 0, width, height);
        let layout = ScreenLayout::new(area, false);
        let (dot_w, dot_h) = layout.map_dots();
        let view = settings.view;

        Self {
            viewport: Viewport::new(view.center_lon, view.center_lat, view.zoom, dot_w, dot_h),
            basemap: BaseMap::new(),
            sequence: None,
            load_state: LoadState::Loading,
            data_path: settings.data_path.clone(),
            palette: settings.palette,
            should_quit: false,
            hovered: None,
            selected: None,
            show_inspector: false,
            last_mouse: None,
            mouse_pos: None,
            dragging_slider: false,
            pending: None,
            area,
            home: view,
            attribute_marker: settings.attribute_marker.clone(),
            style: settings.style.clone(),
        }
    }

    pub fn layout(&self) -> ScreenLayout {
        ScreenLayout::new(self.area, self.show_inspector)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.area = Rect::new(0, 0, width, height);
        self.sync_viewport_size();
    }

    fn sync_viewport_size(&mut self) {
        let (w, h) = self.layout().map_dots();
        self.viewport.width = w;
        self.viewport.height = h;
    }

    // Loading

    /// Wait for the dataset from a spawned load
    pub fn attach_loader(&mut self, rx: oneshot::Receiver<LoadResult>) {
        self.pending = Some(rx);
        self.load_state = LoadState::Loading;
    }

    /// Pick up the load result if it has arrived; called once per frame
    pub fn poll_load(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(Ok(dataset)) => {
                self.pending = None;
                self.on_dataset_loaded(dataset);
            }
            Ok(Err(err)) => {
                self.pending = None;
                warn!(error = %err, cause = ?std::error::Error::source(&err), "dataset load failed");
                self.load_state = LoadState::Failed;
            }
            Err(TryRecvError::Closed) => {
                self.pending = None;
                warn!("dataset load task ended without a result");
                self.load_state = LoadState::Failed;
            }
        }
    }

    /// Discover attributes, render the symbols and attach the sequence
    pub fn on_dataset_loaded(&mut self, dataset: Dataset) {
        let sequence = symbols::build(dataset, &self.attribute_marker, self.style.clone());
        info!(
            markers = sequence.layer().len(),
            attributes = sequence.len(),
            first = ?sequence.current_key().map(|k| k.as_str()),
            "symbols ready"
        );
        self.sequence = Some(sequence);
        self.load_state = LoadState::Ready;
        self.refresh_hover();
    }

    // Sequence

    pub fn forward(&mut self) {
        if let Some(seq) = self.sequence.as_mut() {
            seq.forward();
        }
        self.refresh_hover();
    }

    pub fn reverse(&mut self) {
        if let Some(seq) = self.sequence.as_mut() {
            seq.reverse();
        }
        self.refresh_hover();
    }

    pub fn set_index(&mut self, index: usize) {
        if let Some(seq) = self.sequence.as_mut() {
            seq.set_index(index);
        }
        self.refresh_hover();
    }

    /// Year label of the selected attribute
    pub fn current_label(&self) -> Option<&str> {
        self.sequence
            .as_ref()
            .and_then(|seq| seq.current_key())
            .map(|key| key.year())
    }

    // Viewport

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.refresh_hover();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.refresh_hover();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.refresh_hover();
    }

    /// Zoom in towards a terminal cell
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.layout().map_dot(col, row) {
            self.viewport.zoom_in_at(px as i32, py as i32);
            self.refresh_hover();
        }
    }

    /// Zoom out from a terminal cell
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.layout().map_dot(col, row) {
            self.viewport.zoom_out_at(px as i32, py as i32);
            self.refresh_hover();
        }
    }

    /// Back to the configured center and zoom
    pub fn reset_view(&mut self) {
        let (w, h) = self.layout().map_dots();
        self.viewport = Viewport::new(self.home.center_lon, self.home.center_lat, self.home.zoom, w, h);
        self.refresh_hover();
    }

    pub fn toggle_inspector(&mut self) {
        self.show_inspector = !self.show_inspector;
        self.sync_viewport_size();
        self.refresh_hover();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    // Pointer

    /// Track the pointer and open/close the popup under it
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.refresh_hover();
    }

    fn refresh_hover(&mut self) {
        self.hovered = self.mouse_pos.and_then(|(col, row)| self.marker_at(col, row));
    }

    fn marker_at(&self, col: u16, row: u16) -> Option<FeatureId> {
        let (px, py) = self.layout().map_dot(col, row)?;
        self.sequence
            .as_ref()?
            .layer()
            .hit_test(&self.viewport, px, py)
    }

    /// Left button pressed: controls act immediately, the map starts a drag
    pub fn press(&mut self, col: u16, row: u16) {
        match self.layout().slider.hit(col, row) {
            Some(ControlHit::Reverse) => self.reverse(),
            Some(ControlHit::Skip) => self.forward(),
            Some(ControlHit::Track(offset)) => {
                self.dragging_slider = true;
                self.slide_to(offset);
            }
            None => {
                if let Some(id) = self.marker_at(col, row) {
                    self.selected = Some(id);
                }
                self.last_mouse = Some((col, row));
            }
        }
    }

    fn slide_to(&mut self, offset: u16) {
        let len = self.sequence.as_ref().map_or(0, |seq| seq.len());
        let index = self.layout().slider.index_at(offset, len);
        self.set_index(index);
    }

    /// Mouse drag: move the slider thumb or pan the map
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if self.dragging_slider {
            let track = self.layout().slider.track;
            if track.width == 0 {
                return;
            }
            let offset = col.clamp(track.x, track.right().saturating_sub(1)) - track.x;
            self.slide_to(offset);
            return;
        }
        if let Some((last_x, last_y)) = self.last_mouse {
            // One cell is 2 dots wide and 4 tall
            let dx = (last_x as i32 - col as i32) * 2;
            let dy = (last_y as i32 - row as i32) * 4;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((col, row));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
        self.dragging_slider = false;
    }

    // Queries for drawing

    pub fn hovered_marker(&self) -> Option<&MarkerView> {
        let id = self.hovered?;
        self.sequence.as_ref()?.layer().get(id)
    }

    /// Feature shown in the inspector: the hovered one, else the selected one
    pub fn inspected_feature(&self) -> Option<&Feature> {
        let id = self.hovered.or(self.selected)?;
        self.sequence.as_ref()?.layer().dataset().get(id)
    }

    pub fn name_property(&self) -> &str {
        &self.style.name_property
    }
}
