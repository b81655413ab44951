use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::layout::{Section, SectionKey};
use crate::state::AssignmentTracker;
use super::Message;

/// Scale of the on-screen layout preview (1.0 = canvas pixels)
pub const PREVIEW_SCALE: f32 = 0.5;

const BORDER: Color = Color::BLACK;
const EMPTY_FILL: Color = Color::WHITE;
const ASSIGNED_FILL: Color = Color::from_rgb(0.80, 0.90, 0.80);
const HOVER_FILL: Color = Color::from_rgb(0.93, 0.93, 0.93);

/// Draws one layout as positioned section boxes and turns clicks into
/// "pick an image for this section" messages
pub struct LayoutCanvas {
    pub layout_id: u32,
    pub sections: Vec<Section>,
    /// File name per section, `None` while unassigned
    pub labels: Vec<Option<String>>,
    /// False while a submission is in flight
    pub enabled: bool,
}

impl LayoutCanvas {
    pub fn new(tracker: &AssignmentTracker) -> Self {
        let layout_id = tracker.layout().id;
        let labels = (0..tracker.sections().len())
            .map(|index| {
                tracker
                    .get(SectionKey::new(layout_id, index))
                    .map(|assignment| assignment.image.file_name.clone())
            })
            .collect();

        Self {
            layout_id,
            sections: tracker.sections().to_vec(),
            labels,
            enabled: !tracker.in_flight(),
        }
    }

    /// Index of the section under a point in preview coordinates
    fn section_at(&self, point: Point) -> Option<usize> {
        let (x, y) = (point.x / PREVIEW_SCALE, point.y / PREVIEW_SCALE);
        self.sections.iter().position(|section| section.contains(x, y))
    }
}

fn scaled(section: &Section) -> (Point, Size) {
    (
        Point::new(section.x as f32 * PREVIEW_SCALE, section.y as f32 * PREVIEW_SCALE),
        Size::new(section.width as f32 * PREVIEW_SCALE, section.height as f32 * PREVIEW_SCALE),
    )
}

impl Program<Message> for LayoutCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let hovered = cursor
            .position_in(bounds)
            .and_then(|point| self.section_at(point))
            .filter(|_| self.enabled);

        for (index, section) in self.sections.iter().enumerate() {
            let (top_left, size) = scaled(section);
            let label = self.labels.get(index).cloned().flatten();

            let fill = match (&label, hovered == Some(index)) {
                (Some(_), _) => ASSIGNED_FILL,
                (None, true) => HOVER_FILL,
                (None, false) => EMPTY_FILL,
            };
            frame.fill_rectangle(top_left, size, fill);
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default().with_color(BORDER).with_width(2.0),
            );

            frame.fill_text(Text {
                content: label.unwrap_or_else(|| "Select Image".to_string()),
                position: Point::new(top_left.x + 8.0, top_left.y + 8.0),
                color: BORDER,
                size: Pixels(14.0),
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.enabled {
            return (canvas::event::Status::Ignored, None);
        }

        if let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            if let Some(index) = cursor.position_in(bounds).and_then(|point| self.section_at(point)) {
                let key = SectionKey::new(self.layout_id, index);
                return (canvas::event::Status::Captured, Some(Message::PickImage(key)));
            }
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        match cursor.position_in(bounds).and_then(|point| self.section_at(point)) {
            Some(_) if self.enabled => mouse::Interaction::Pointer,
            _ => mouse::Interaction::default(),
        }
    }
}
