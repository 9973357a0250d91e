use crate::app::{App, LoadState};
use crate::braille::{braille_char, BrailleCanvas};
use crate::layout::{ScreenLayout, SliderLayout, REVERSE_LABEL, SKIP_LABEL};
use crate::symbols::MarkerView;
use geojson::JsonValue;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = ScreenLayout::new(frame.area(), app.show_inspector);

    render_map(frame, app, &layout);
    if let Some(area) = layout.inspector {
        render_inspector(frame, app, area);
    }
    render_controls(frame, app, &layout);
    render_status_bar(frame, app, layout.status);
}

fn render_map(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    let title = app
        .data_path
        .file_stem()
        .map(|s| format!(" {} ", s.to_string_lossy()))
        .unwrap_or_else(|| " Map ".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, layout.map);

    let inner = layout.map_inner;
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let (w, h) = (inner.width as usize, inner.height as usize);
    let mut grid = BrailleCanvas::new(w, h);
    let mut coast = BrailleCanvas::new(w, h);
    let mut fill = BrailleCanvas::new(w, h);
    let mut stroke = BrailleCanvas::new(w, h);

    app.basemap.render(&viewport, &mut coast, &mut grid);
    if let Some(seq) = &app.sequence {
        seq.layer().draw(&viewport, &mut fill, &mut stroke);
    }

    frame.render_widget(
        MapWidget {
            grid,
            coast,
            fill,
            stroke,
            fill_color: app.palette.fill,
            stroke_color: app.palette.stroke,
        },
        inner,
    );

    if app.load_state == LoadState::Loading {
        let text = format!("Loading {}…", app.data_path.display());
        let row = Rect::new(inner.x, inner.y + inner.height / 2, inner.width, 1.min(inner.height));
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            row,
        );
    }

    if let Some(marker) = app.hovered_marker() {
        let (px, py) = viewport.project_f(marker.position.0, marker.position.1);
        if let Some(area) = popup_area(marker, px, py, inner) {
            frame.render_widget(Clear, area);
            frame.render_widget(popup_widget(marker), area);
        }
    }
}

/// Box above the symbol, or below it when there is no room above
fn popup_area(marker: &MarkerView, px: f64, py: f64, inner: Rect) -> Option<Rect> {
    let lines = marker.popup.text_lines();
    let width = (lines.iter().map(|l| l.chars().count()).max()? as u16 + 2).min(inner.width);
    let height = (lines.len() as u16 + 2).min(inner.height);
    if width < 3 || height < 3 {
        return None;
    }

    let radius_rows = (marker.popup.offset() / 4.0).ceil().min(inner.height as f64) as i32;
    let col = inner.x as i32 + (px / 2.0) as i32;
    let row = inner.y as i32 + (py / 4.0) as i32;

    let above = row - radius_rows - height as i32;
    let top = if above >= inner.y as i32 {
        above
    } else {
        row + radius_rows + 1
    };
    let max_top = (inner.bottom() - height) as i32;
    let top = top.clamp(inner.y as i32, max_top);
    let max_left = (inner.right() - width) as i32;
    let left = (col - width as i32 / 2).clamp(inner.x as i32, max_left);

    Some(Rect::new(left as u16, top as u16, width, height))
}

fn popup_widget(marker: &MarkerView) -> Paragraph<'static> {
    let lines: Vec<Line> = marker
        .popup
        .lines()
        .iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(
                    format!("{}: ", line.label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(line.value.clone()),
            ])
        })
        .collect();
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    )
}

/// Braille layers composited back to front
struct MapWidget {
    grid: BrailleCanvas,
    coast: BrailleCanvas,
    fill: BrailleCanvas,
    stroke: BrailleCanvas,
    fill_color: Color,
    stroke_color: Color,
}

impl MapWidget {
    fn paint(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, bits) in canvas.occupied() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let pos = (area.x + col as u16, area.y + row as u16);
            buf[pos].set_char(braille_char(bits)).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::paint(&self.grid, Color::DarkGray, area, buf);
        Self::paint(&self.coast, Color::Cyan, area, buf);
        Self::paint(&self.fill, self.fill_color, area, buf);

        // Outline cells keep the fill dots they share
        for (col, row, bits) in self.stroke.occupied() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let merged = bits | self.fill.bits(col, row);
            let pos = (area.x + col as u16, area.y + row as u16);
            buf[pos].set_char(braille_char(merged)).set_fg(self.stroke_color);
        }
    }
}

fn render_inspector(frame: &mut Frame, app: &App, area: Rect) {
    let feature = app.inspected_feature();
    let title = feature
        .map(|f| format!(" {} ", f.name(app.name_property())))
        .unwrap_or_else(|| " Properties ".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(title, Style::default().fg(Color::Cyan)));

    let lines: Vec<Line> = match feature {
        Some(feature) => feature
            .properties
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(Color::Yellow)),
                    Span::raw(property_text(value)),
                ])
            })
            .collect(),
        None => vec![Line::styled(
            "Hover or click a symbol",
            Style::default().fg(Color::DarkGray),
        )],
    };

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn property_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_controls(frame: &mut Frame, app: &App, layout: &ScreenLayout) {
    let label = app.current_label().unwrap_or("-");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Sequence: {label} "),
            Style::default().fg(Color::Cyan),
        ));
    frame.render_widget(block, layout.controls);

    let (index, len) = app
        .sequence
        .as_ref()
        .map_or((0, 0), |seq| (seq.index(), seq.len()));
    let active = len > 0;
    frame.render_widget(
        SliderWidget {
            slider: layout.slider,
            index,
            len,
            active,
        },
        layout.controls,
    );
}

/// Track with thumb plus the two step buttons
struct SliderWidget {
    slider: SliderLayout,
    index: usize,
    len: usize,
    active: bool,
}

impl Widget for SliderWidget {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        if self.slider.track.height == 0 {
            return;
        }
        let (button, track, thumb) = if self.active {
            (
                Style::default().fg(Color::Yellow),
                Style::default().fg(Color::Gray),
                Style::default().fg(Color::Rgb(0xff, 0x78, 0x00)),
            )
        } else {
            let dim = Style::default().fg(Color::DarkGray);
            (dim, dim, dim)
        };

        let SliderLayout { reverse, track: bar, skip } = self.slider;
        buf.set_stringn(reverse.x, reverse.y, REVERSE_LABEL, reverse.width as usize, button);
        buf.set_stringn(skip.x, skip.y, SKIP_LABEL, skip.width as usize, button);

        if bar.width == 0 || bar.height == 0 {
            return;
        }
        for x in bar.left()..bar.right() {
            buf[(x, bar.y)].set_char('━').set_style(track);
        }
        let thumb_x = bar.x + self.slider.thumb_offset(self.index, self.len);
        buf[(thumb_x, bar.y)].set_char('●').set_style(thumb);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };
    let (state, state_color) = match app.load_state {
        LoadState::Loading => ("loading", Color::Yellow),
        LoadState::Ready => ("ready", Color::Green),
        LoadState::Failed => ("no data", Color::DarkGray),
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(state, Style::default().fg(state_color)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        toggle(app.basemap.show_graticule, "[G]rid ", "[g]rid "),
        toggle(app.basemap.show_coastlines, "[C]oast ", "[c]oast "),
        toggle(app.show_inspector, "[I]nspect ", "[i]nspect "),
        Span::styled(
            "| [ ]:step 1-9:jump hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Cli, Settings};
    use crate::loader;
    use clap::Parser;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::Path;

    const TWO_CITIES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"City": "Tokyo", "Pop_1985": 30.3, "Pop_2015": 38.0},
         "geometry": {"type": "Point", "coordinates": [139.7, 35.7]}},
        {"type": "Feature", "properties": {"City": "Cairo", "Pop_1985": 8.3, "Pop_2015": 18.8},
         "geometry": {"type": "Point", "coordinates": [31.2, 30.0]}}
    ]}"#;

    fn app(width: u16, height: u16) -> App {
        let settings = Settings::merge(Cli::parse_from(["propmap"]), AppConfig::default()).unwrap();
        let mut app = App::new(&settings, width, height);
        app.on_dataset_loaded(loader::parse(Path::new("two"), TWO_CITIES).unwrap());
        app
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_frame_shows_controls_and_year() {
        let app = app(100, 30);
        let text = screen(&app, 100, 30);
        assert!(text.contains(REVERSE_LABEL));
        assert!(text.contains(SKIP_LABEL));
        assert!(text.contains("Sequence: 1985"));
        assert!(text.contains('●'));
        assert!(text.contains("ready"));
    }

    #[test]
    fn test_hover_draws_popup() {
        let mut app = app(100, 30);
        let (px, py) = app.viewport.project_f(139.7, 35.7);
        let inner = app.layout().map_inner;
        app.set_mouse_pos(inner.x + (px / 2.0) as u16, inner.y + (py / 4.0) as u16);
        assert!(app.hovered.is_some());

        let text = screen(&app, 100, 30);
        assert!(text.contains("City: Tokyo"));
        assert!(text.contains("Population in 1985: 30.3 million"));
    }

    #[test]
    fn test_inspector_lists_properties() {
        let mut app = app(100, 30);
        app.toggle_inspector();
        app.selected = Some(crate::dataset::FeatureId(1));
        let text = screen(&app, 100, 30);
        assert!(text.contains(" Cairo "));
        assert!(text.contains("Pop_2015: 18.8"));
    }

    #[test]
    fn test_popup_prefers_space_above() {
        let layer_app = app(100, 30);
        let marker = layer_app.sequence.as_ref().unwrap().layer().markers().next().unwrap().clone();
        let inner = Rect::new(1, 1, 98, 22);

        let area = popup_area(&marker, 100.0, 80.0, inner).unwrap();
        assert!(area.bottom() as f64 <= 1.0 + 80.0 / 4.0);

        let area = popup_area(&marker, 100.0, 2.0, inner).unwrap();
        assert!(area.y > 1);
    }

    #[test]
    fn test_popup_for_huge_symbol_stays_inside_map() {
        let mut big = App::new(
            &Settings::merge(Cli::parse_from(["propmap"]), AppConfig::default()).unwrap(),
            100,
            30,
        );
        let text = TWO_CITIES.replace("38.0", "38000000");
        big.on_dataset_loaded(loader::parse(Path::new("raw"), &text).unwrap());
        big.forward();
        let marker = big.sequence.as_ref().unwrap().layer().markers().next().unwrap().clone();
        assert!(marker.popup.offset() > 24_000.0);

        let inner = Rect::new(1, 1, 98, 22);
        let area = popup_area(&marker, 100.0, 40.0, inner).unwrap();
        assert!(area.y >= inner.y && area.bottom() <= inner.bottom());
    }
}
