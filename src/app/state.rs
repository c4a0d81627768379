use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use fltk::{
    app::Sender,
    browser::HoldBrowser,
    button::Button,
    dialog::{self, ColorMode},
    enums::Color,
    frame::Frame,
    group::Flex,
    input::Input,
    menu::Choice,
    prelude::*,
    window::Window,
};
use tracing::{error, info, warn};

use super::controllers::map::marker_label;
use super::controllers::session::{GeocodeApplied, StampSession};
use super::domain::color::LineColor;
use super::domain::map_style::MapStyle;
use super::domain::messages::Message;
use super::domain::template::TemplateCatalog;
use super::infrastructure::config::{AppConfig, ExportStrategy};
use super::infrastructure::error::AppError;
use super::infrastructure::token::Ticket;
use super::services::export::fonts::FontBook;
use super::services::export::static_map::StaticMapClient;
use super::services::export::{LiveCapture, MapImageSource, StampExporter};
use super::services::geocoder::{GeocodeOutcome, MapboxGeocoder, resolve};
use super::services::payment::PaymentBridge;
use super::services::persistence::StateStore;
use crate::ui::dialogs::order_id::show_order_id_dialog;
use crate::ui::main_window::{MainWidgets, STAMP_MARGIN, build_main_window};
use crate::ui::map_view::PreviewMap;

pub const NOT_FOUND_ALERT: &str = "No se pudo encontrar ese destino. Intenta con otro nombre.";
pub const NEED_TWO_ALERT: &str = "Añade al menos 2 destinos para crear tu estampita";
pub const RENDER_FAILED_ALERT: &str = "Hubo un error al generar la imagen. Inténtalo de nuevo.";
pub const PAYMENT_FAILED_ALERT: &str = "No se pudo iniciar el proceso de pago. Inténtalo de nuevo.";
pub const NOT_VERIFIED_ALERT: &str = "No se pudo verificar el pago. Inténtalo de nuevo.";

/// FLTK treats `@` in labels as a symbol prefix.
fn label_text(text: &str) -> String {
    text.replace('@', "@@")
}

pub struct AppController {
    pub window: Window,
    destination_input: Input,
    destination_list: HoldBrowser,
    title_input: Input,
    style_choice: Choice,
    template_choice: Choice,
    color_button: Button,
    stamp: Flex,
    caption: Flex,
    title_frame: Frame,
    route_frame: Frame,
    sender: Sender<Message>,
    session: StampSession<PreviewMap>,
    exporter: StampExporter,
    payment: PaymentBridge,
    geocoder: Arc<MapboxGeocoder>,
    static_map: StaticMapClient,
    strategy: ExportStrategy,
    output_dir: PathBuf,
}

impl AppController {
    pub fn new(config: &AppConfig, sender: Sender<Message>) -> Self {
        let MainWidgets {
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
        } = build_main_window(&sender);

        let preview_fonts = match FontBook::load(&config.fonts) {
            Ok(fonts) => Some(Rc::new(fonts)),
            Err(e) => {
                warn!("Map labels disabled: {}", e);
                None
            }
        };
        let preview = PreviewMap::new(map_frame, sender, preview_fonts);
        let session = StampSession::new(preview, StateStore::default_location());

        if config.mapbox.access_token.is_empty() {
            warn!("No Mapbox access token configured; geocoding and static maps will fail");
        }

        let mut controller = Self {
            window: wind,
            destination_input,
            destination_list,
            title_input,
            style_choice,
            template_choice,
            color_button,
            stamp,
            caption,
            title_frame,
            route_frame,
            sender,
            session,
            exporter: StampExporter::new(config.fonts.clone(), config.export_scale()),
            payment: PaymentBridge::from_config(&config.payment),
            geocoder: Arc::new(MapboxGeocoder::new(
                config.mapbox.geocoding_endpoint.clone(),
                config.mapbox.access_token.clone(),
            )),
            static_map: StaticMapClient::new(
                config.mapbox.static_endpoint.clone(),
                config.mapbox.access_token.clone(),
            ),
            strategy: config.export.strategy,
            output_dir: config.output_dir(),
        };
        controller.load_widgets();
        controller
    }

    /// Handle one message. Returns false when the app should quit.
    pub fn handle(&mut self, msg: Message) -> bool {
        match msg {
            Message::AddDestination(name) => self.add_destination(&name),
            Message::GeocodeFinished {
                ticket,
                name,
                outcome,
            } => self.geocode_finished(ticket, &name, outcome),
            Message::RemoveSelectedDestination => self.remove_selected_destination(),
            Message::TitleChanged(title) => {
                self.session.set_title(&title);
                self.refresh_caption();
            }
            Message::MapStyleSelected(index) => {
                if let Some(style) = MapStyle::all().get(index) {
                    self.session.set_map_style(style.id);
                }
            }
            Message::TemplateSelected(index) => {
                if let Some(template) = TemplateCatalog::all().get(index) {
                    self.session.set_template(template.id);
                    self.apply_template_layout();
                }
            }
            Message::PickLineColor => self.pick_line_color(),
            Message::MapStyleLoaded(ticket) => {
                self.session.on_style_loaded(ticket);
            }
            Message::MapResized => self.apply_template_layout(),
            Message::DownloadFree => self.download(false),
            Message::DownloadPremium => self.start_checkout(),
            Message::CheckoutSucceeded(order_id) => self.verify_order(order_id),
            Message::PaymentVerified { order_id, verified } => {
                if verified {
                    info!(order_id, "payment verified");
                    self.download(true);
                } else {
                    warn!(order_id, "payment not verified");
                    dialog::alert_default(NOT_VERIFIED_ALERT);
                }
            }
            Message::Quit => return false,
        }
        true
    }

    /// Push the restored state into the widgets.
    fn load_widgets(&mut self) {
        let state = self.session.state().clone();
        self.title_input.set_value(&state.title);
        if let Some(i) = MapStyle::position(&state.map_style_id) {
            self.style_choice.set_value(i as i32);
        }
        if let Some(i) = TemplateCatalog::position(&state.template_id) {
            self.template_choice.set_value(i as i32);
        }
        self.refresh_color_button(state.line_color);
        self.refresh_route();
        self.apply_template_layout();
    }

    fn refresh_route(&mut self) {
        self.destination_list.clear();
        for (i, destination) in self.session.route().destinations().iter().enumerate() {
            self.destination_list
                .add(&format!("{}. {}", marker_label(i), label_text(&destination.name)));
        }
        self.refresh_caption();
    }

    fn refresh_caption(&mut self) {
        self.title_frame
            .set_label(&label_text(&self.session.state().title));
        self.route_frame
            .set_label(&label_text(&self.session.route().display_string()));
        self.caption.redraw();
    }

    fn refresh_color_button(&mut self, color: LineColor) {
        self.color_button
            .set_color(Color::from_rgb(color.r, color.g, color.b));
        let (r, g, b) = (color.r as u32, color.g as u32, color.b as u32);
        let luma = (r * 299 + g * 587 + b * 114) / 1000;
        self.color_button
            .set_label_color(if luma > 140 { Color::Black } else { Color::White });
        self.color_button.redraw();
    }

    /// Give the map the template's share of the preview height.
    fn apply_template_layout(&mut self) {
        let template = self.session.template();
        let inner = (self.stamp.h() - 2 * STAMP_MARGIN).max(0);
        let text_height = (inner as f32 * (1.0 - template.map_area)).round() as i32;
        self.stamp.fixed(&self.caption, text_height);
        self.window.redraw();
    }

    fn add_destination(&mut self, name: &str) {
        let Some(lookup) = self.session.begin_geocode(name) else {
            return;
        };
        let geocoder = Arc::clone(&self.geocoder);
        let sender = self.sender;
        std::thread::spawn(move || {
            let outcome = resolve(geocoder.as_ref(), &lookup.name);
            sender.send(Message::GeocodeFinished {
                ticket: lookup.ticket,
                name: lookup.name,
                outcome,
            });
        });
    }

    fn geocode_finished(&mut self, ticket: Ticket, name: &str, outcome: GeocodeOutcome) {
        let settled = self.session.finish_geocode(ticket, name, outcome);
        let mut added = false;
        let mut missing = false;
        for lookup in &settled {
            match lookup.applied {
                GeocodeApplied::Added => {
                    added = true;
                    // Keep a name typed since this lookup started.
                    if self.destination_input.value().trim() == lookup.name {
                        self.destination_input.set_value("");
                    }
                }
                GeocodeApplied::NotFound => missing = true,
            }
        }
        if added {
            self.refresh_route();
        }
        if missing {
            dialog::alert_default(NOT_FOUND_ALERT);
        }
    }

    fn remove_selected_destination(&mut self) {
        let selected = self.destination_list.value();
        if selected > 0 && self.session.remove_destination(selected as usize - 1) {
            self.refresh_route();
        }
    }

    fn pick_line_color(&mut self) {
        let current = self.session.state().line_color;
        let Some((r, g, b)) = dialog::color_chooser("Color de línea", ColorMode::Rgb) else {
            return;
        };
        let color = LineColor::rgb(r, g, b);
        if color != current {
            self.session.set_line_color(color);
            self.refresh_color_button(color);
        }
    }

    fn start_checkout(&mut self) {
        if self.session.ensure_exportable().is_err() {
            dialog::alert_default(NEED_TWO_ALERT);
            return;
        }
        let payload = self.session.checkout_payload();
        if !self.payment.initiate_payment(&payload) {
            dialog::alert_default(PAYMENT_FAILED_ALERT);
            return;
        }
        if let Some(order_id) = show_order_id_dialog() {
            self.sender.send(Message::CheckoutSucceeded(order_id));
        }
    }

    fn verify_order(&mut self, order_id: String) {
        let verifier = self.payment.verifier();
        let sender = self.sender;
        std::thread::spawn(move || {
            let verified = verifier.verify_payment(&order_id);
            sender.send(Message::PaymentVerified { order_id, verified });
        });
    }

    fn download(&mut self, premium: bool) {
        let state = self.session.state().clone();
        let route = self.session.route().clone();

        let result = match self.strategy {
            ExportStrategy::Live => {
                let mut source = LiveCapture::new(self.session.presenter_mut());
                self.exporter.export(&state, &route, &mut source, premium)
            }
            ExportStrategy::Static => {
                let source: &mut dyn MapImageSource = &mut self.static_map;
                self.exporter.export(&state, &route, source, premium)
            }
        };

        match result.and_then(|stamp| stamp.save_into(&self.output_dir)) {
            Ok(path) => {
                dialog::message_default(&format!("Estampita guardada en {}", path.display()));
            }
            Err(AppError::NotEnoughDestinations(_)) => dialog::alert_default(NEED_TWO_ALERT),
            Err(e) => {
                error!("Stamp export failed: {}", e);
                dialog::alert_default(RENDER_FAILED_ALERT);
            }
        }
    }
}
