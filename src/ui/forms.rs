/// Dialog forms: new world, new view and the parameterised edit operations
use iced::widget::{button, checkbox, column, pick_list, row, slider, text, text_input, Column};
use iced::{Alignment, Element, Length};
use std::ops::RangeInclusive;

use crate::backend::types::Shape;
use crate::catalog;
use crate::state::forms::{GenerationForm, NewViewForm, OperationForm};
use crate::{ColourField, Message};

pub fn generation_view(form: &GenerationForm) -> Element<'_, Message> {
    let wrap = Message::GenerationChanged;
    column![
        text("Create New World").size(24),
        field(
            "Seed",
            text_input("number or any text", &form.seed)
                .on_input(edit(form, |f, v| f.seed = v, wrap)),
        ),
        field(
            "Shape",
            pick_list(
                &Shape::ALL[..],
                Some(form.shape),
                edit(form, |f, v| f.shape = v, wrap)
            ),
        ),
        float_slider(
            "Water Percentage",
            0.0..=100.0,
            form.water_percentage,
            1.0,
            edit(form, |f, v| f.water_percentage = v, wrap),
        ),
        int_slider(
            "Number of Plates",
            1..=50,
            form.plates,
            1,
            edit(form, |f, v| f.plates = v, wrap),
        ),
        float_slider(
            "Islands",
            0.0..=10.0,
            form.islands,
            0.1,
            edit(form, |f, v| f.islands = v, wrap),
        ),
        int_slider(
            "Width",
            10..=5000,
            form.width,
            10,
            edit(form, |f, v| f.width = v, wrap),
        ),
        int_slider(
            "Height",
            10..=2500,
            form.height,
            10,
            edit(form, |f, v| f.height = v, wrap),
        ),
        int_slider(
            "Erosion Iterations",
            0..=50,
            form.erosion_iterations,
            1,
            edit(form, |f, v| f.erosion_iterations = v, wrap),
        ),
        checkbox("Supercontinent", form.supercontinent)
            .on_toggle(edit(form, |f, v| f.supercontinent = v, wrap)),
        checkbox("Climate", form.climate).on_toggle(edit(form, |f, v| f.climate = v, wrap)),
        checkbox("Hotspots", form.hotspots)
            .on_toggle(edit(form, |f, v| f.hotspots = v, wrap)),
        row![
            button("Generate").on_press(Message::SubmitGeneration),
            button("Cancel")
                .on_press(Message::CancelDialog)
                .style(button::secondary),
        ]
        .spacing(10),
    ]
    .spacing(10)
    .padding(10)
    .into()
}

pub fn new_view_view<'a>(form: &'a NewViewForm, colour_text: &'a [String; 4]) -> Element<'a, Message> {
    let wrap = Message::ViewFormChanged;
    let projection = catalog::PROJECTIONS
        .iter()
        .find(|p| **p == form.projection)
        .copied();
    let scheme = catalog::COLOR_SCHEME_NAMES
        .iter()
        .find(|s| **s == form.color_scheme)
        .copied();

    let mut layout = column![
        text("Create New View").size(24),
        field(
            "Name",
            text_input("defaults to the projection", &form.name)
                .on_input(edit(form, |f, v| f.name = v, wrap)),
        ),
        field(
            "Projection",
            pick_list(
                &catalog::PROJECTIONS[..],
                projection,
                edit(form, |f, v: &'static str| f.projection = v.to_string(), wrap)
            ),
        ),
        int_slider(
            "Width",
            10..=10000,
            form.width,
            10,
            edit(form, |f, v| f.width = v, wrap),
        ),
        int_slider(
            "Height",
            10..=5000,
            form.height,
            10,
            edit(form, |f, v| f.height = v, wrap),
        ),
        int_slider(
            "Parallels Interval",
            0..=360,
            form.parallels_interval,
            1,
            edit(form, |f, v| f.parallels_interval = v, wrap),
        ),
        int_slider(
            "Rotation Frames",
            1..=120,
            form.rotation_frames,
            1,
            edit(form, |f, v| f.rotation_frames = v, wrap),
        ),
        float_slider(
            "Center Latitude",
            -90.0..=90.0,
            form.center_latitude,
            1.0,
            edit(form, |f, v| f.center_latitude = v, wrap),
        ),
        float_slider(
            "Rotation",
            -180.0..=180.0,
            form.rotation,
            1.0,
            edit(form, |f, v| f.rotation = v, wrap),
        ),
    ]
    .spacing(10)
    .padding(10);

    for colour in ColourField::ALL {
        layout = layout.push(field(
            colour.label(),
            text_input("#AARRGGBB", &colour_text[colour as usize])
                .on_input(move |value| Message::ColourChanged(colour, value)),
        ));
    }

    layout = layout.push(field(
        "Height Colors",
        pick_list(
            &catalog::COLOR_SCHEME_NAMES[..],
            scheme,
            edit(form, |f, v: &'static str| f.color_scheme = v.to_string(), wrap),
        ),
    ));

    let layers = NewViewForm::checkbox_layers().fold(Column::new().spacing(4), |list, layer| {
        list.push(
            checkbox(layer, form.layers.contains(layer))
                .on_toggle(move |enabled| Message::ToggleLayer(layer, enabled)),
        )
    });

    layout
        .push(text("Layers").size(18))
        .push(layers)
        .push(
            checkbox("Render to disk", form.render_to_disk)
                .on_toggle(edit(form, |f, v| f.render_to_disk = v, wrap)),
        )
        .push(
            row![
                button("Create View").on_press(Message::SubmitView),
                button("Cancel")
                    .on_press(Message::CancelDialog)
                    .style(button::secondary),
            ]
            .spacing(10),
        )
        .into()
}

pub fn operation_view(form: &OperationForm) -> Element<'static, Message> {
    let mut layout = column![text(form.title()).size(24)].spacing(10).padding(10);
    for (index, (label, value, min, max)) in form.fields().into_iter().enumerate() {
        layout = layout.push(float_slider(
            label,
            min..=max,
            value,
            0.5,
            move |v| Message::OperationField(index, v),
        ));
    }
    layout
        .push(
            row![
                button("Apply").on_press(Message::SubmitOperation),
                button("Cancel")
                    .on_press(Message::CancelDialog)
                    .style(button::secondary),
            ]
            .spacing(10),
        )
        .into()
}

/// Callback producing a copy of `form` with one field changed
fn edit<F, T>(
    form: &F,
    apply: impl Fn(&mut F, T) + 'static,
    wrap: fn(F) -> Message,
) -> impl Fn(T) -> Message + 'static
where
    F: Clone + 'static,
{
    let form = form.clone();
    move |value| {
        let mut form = form.clone();
        apply(&mut form, value);
        wrap(form)
    }
}

fn field<'a>(label: &'a str, control: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    row![text(label).width(Length::Fixed(180.0)), control.into()]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}

fn float_slider<'a>(
    label: &'a str,
    range: RangeInclusive<f32>,
    value: f32,
    step: f32,
    on_change: impl Fn(f32) -> Message + 'a,
) -> Element<'a, Message> {
    field(
        label,
        row![
            slider(range, value, on_change)
                .step(step)
                .width(Length::Fixed(260.0)),
            text(format!("{:.1}", value)),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    )
}

fn int_slider<'a>(
    label: &'a str,
    range: RangeInclusive<u32>,
    value: u32,
    step: u32,
    on_change: impl Fn(u32) -> Message + 'a,
) -> Element<'a, Message> {
    field(
        label,
        row![
            slider(range, value, on_change)
                .step(step)
                .width(Length::Fixed(260.0)),
            text(value.to_string()),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    )
}
