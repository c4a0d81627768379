use fltk::{
    app::Sender,
    browser::HoldBrowser,
    button::Button,
    enums::{Align, CallbackTrigger, Color, Font, FrameType},
    frame::Frame,
    group::{Flex, FlexType},
    input::Input,
    menu::{Choice, MenuBar},
    prelude::*,
    window::Window,
};

use super::menu::build_menu;
use crate::app::domain::map_style::MapStyle;
use crate::app::domain::messages::Message;
use crate::app::domain::template::TemplateCatalog;

const SIDEBAR_WIDTH: i32 = 320;
const ROW_HEIGHT: i32 = 30;
const LABEL_HEIGHT: i32 = 20;
/// Width of the indigo frame around the stamp preview.
pub const STAMP_MARGIN: i32 = 8;

pub struct MainWidgets {
    pub wind: Window,
    pub destination_input: Input,
    pub destination_list: HoldBrowser,
    pub title_input: Input,
    pub style_choice: Choice,
    pub template_choice: Choice,
    pub color_button: Button,
    /// Column holding the map, the title and the route text.
    pub stamp: Flex,
    pub map_frame: Frame,
    pub caption: Flex,
    pub title_frame: Frame,
    pub route_frame: Frame,
}

fn section_label(text: &str, flex: &mut Flex) {
    let label = Frame::default()
        .with_label(text)
        .with_align(Align::Left | Align::Inside);
    flex.fixed(&label, LABEL_HEIGHT);
}

pub fn build_main_window(sender: &Sender<Message>) -> MainWidgets {
    let s = sender;
    let mut wind = Window::new(100, 100, 1080, 720, "TravelPrint");
    wind.set_xclass("TravelPrint");

    let mut root = Flex::new(0, 0, 1080, 720, None);
    root.set_type(FlexType::Column);

    let mut menu = MenuBar::new(0, 0, 0, ROW_HEIGHT, "");
    build_menu(&mut menu, sender);
    root.fixed(&menu, ROW_HEIGHT);

    let mut body = Flex::default();
    body.set_type(FlexType::Row);
    body.set_margin(10);
    body.set_spacing(10);

    // Sidebar
    let mut side = Flex::default();
    side.set_type(FlexType::Column);
    side.set_spacing(6);

    section_label("Destino", &mut side);
    let mut add_row = Flex::default();
    add_row.set_type(FlexType::Row);
    let mut destination_input = Input::default();
    let mut add_btn = Button::default().with_label("Añadir");
    add_row.fixed(&add_btn, 80);
    add_row.end();
    side.fixed(&add_row, ROW_HEIGHT);

    section_label("Ruta", &mut side);
    let destination_list = HoldBrowser::default();
    let mut remove_btn = Button::default().with_label("Eliminar destino");
    side.fixed(&remove_btn, ROW_HEIGHT);

    section_label("Título", &mut side);
    let mut title_input = Input::default();
    side.fixed(&title_input, ROW_HEIGHT);

    section_label("Estilo del mapa", &mut side);
    let mut style_choice = Choice::default();
    for style in MapStyle::all() {
        style_choice.add_choice(style.display_name);
    }
    side.fixed(&style_choice, ROW_HEIGHT);

    section_label("Plantilla", &mut side);
    let mut template_choice = Choice::default();
    for template in TemplateCatalog::all() {
        template_choice.add_choice(template.display_name);
    }
    side.fixed(&template_choice, ROW_HEIGHT);

    let mut color_button = Button::default().with_label("Color de línea");
    side.fixed(&color_button, ROW_HEIGHT);

    let mut free_btn = Button::default().with_label("Descargar gratis");
    side.fixed(&free_btn, ROW_HEIGHT + 6);
    let mut premium_btn = Button::default().with_label("Descargar sin marca de agua");
    premium_btn.set_color(Color::from_rgb(0x4F, 0x46, 0xE5));
    premium_btn.set_label_color(Color::White);
    side.fixed(&premium_btn, ROW_HEIGHT + 6);

    side.end();
    body.fixed(&side, SIDEBAR_WIDTH);

    // Stamp preview
    let mut stamp = Flex::default();
    stamp.set_type(FlexType::Column);
    stamp.set_frame(FrameType::BorderBox);
    stamp.set_color(Color::from_rgb(0xE0, 0xE7, 0xFF));
    stamp.set_margin(STAMP_MARGIN);

    let map_frame = Frame::default();

    let mut caption = Flex::default();
    caption.set_type(FlexType::Column);
    caption.set_frame(FrameType::FlatBox);
    caption.set_color(Color::White);
    caption.set_margin(16);
    let mut title_frame = Frame::default();
    title_frame.set_label_font(Font::HelveticaBold);
    title_frame.set_label_size(20);
    caption.fixed(&title_frame, 28);
    let mut route_frame = Frame::default();
    route_frame.set_label_size(16);
    route_frame.set_label_color(Color::from_rgb(0x4B, 0x55, 0x63));
    route_frame.set_align(Align::Center | Align::Inside | Align::Wrap);
    caption.end();

    stamp.end();
    body.end();
    root.end();
    wind.resizable(&root);
    wind.end();

    // Widget callbacks feed the message loop
    add_btn.set_callback({
        let s = *s;
        let input = destination_input.clone();
        move |_| s.send(Message::AddDestination(input.value()))
    });
    destination_input.set_trigger(CallbackTrigger::EnterKey);
    destination_input.set_callback({
        let s = *s;
        move |i| s.send(Message::AddDestination(i.value()))
    });
    remove_btn.set_callback({
        let s = *s;
        move |_| s.send(Message::RemoveSelectedDestination)
    });
    title_input.set_trigger(CallbackTrigger::Changed);
    title_input.set_callback({
        let s = *s;
        move |i| s.send(Message::TitleChanged(i.value()))
    });
    style_choice.set_callback({
        let s = *s;
        move |c| {
            if c.value() >= 0 {
                s.send(Message::MapStyleSelected(c.value() as usize));
            }
        }
    });
    template_choice.set_callback({
        let s = *s;
        move |c| {
            if c.value() >= 0 {
                s.send(Message::TemplateSelected(c.value() as usize));
            }
        }
    });
    color_button.set_callback({
        let s = *s;
        move |_| s.send(Message::PickLineColor)
    });
    free_btn.set_callback({
        let s = *s;
        move |_| s.send(Message::DownloadFree)
    });
    premium_btn.set_callback({
        let s = *s;
        move |_| s.send(Message::DownloadPremium)
    });
    wind.resize_callback({
        let s = *s;
        move |_, _, _, _, _| s.send(Message::MapResized)
    });
    wind.set_callback({
        let s = *s;
        move |_| {
            if fltk::app::event() == fltk::enums::Event::Close {
                s.send(Message::Quit);
            }
        }
    });

    MainWidgets {
        wind,
        destination_input,
        destination_list,
        title_input,
        style_choice,
        template_choice,
        color_button,
        stamp,
        map_frame,
        caption,
        title_frame,
        route_frame,
    }
}
