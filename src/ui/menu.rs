use fltk::{
    app::Sender,
    enums::{Key, Shortcut},
    menu::{MenuBar, MenuFlag},
    prelude::*,
};

use crate::app::domain::messages::Message;

pub fn build_menu(menu: &mut MenuBar, sender: &Sender<Message>) {
    let s = sender;

    // Estampita
    menu.add("Estampita/Descargar gratis", Shortcut::Ctrl | 's', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::DownloadFree) });
    menu.add("Estampita/Descargar sin marca de agua...", Shortcut::Ctrl | Shortcut::Shift | 's', MenuFlag::MenuDivider, { let s = *s; move |_| s.send(Message::DownloadPremium) });
    menu.add("Estampita/Salir", Shortcut::Ctrl | 'q', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::Quit) });

    // Ruta
    menu.add("Ruta/Eliminar destino", Shortcut::Ctrl | Key::Delete, MenuFlag::Normal, { let s = *s; move |_| s.send(Message::RemoveSelectedDestination) });

    // Estilo
    menu.add("Estilo/Color de línea...", Shortcut::Ctrl | 'l', MenuFlag::Normal, { let s = *s; move |_| s.send(Message::PickLineColor) });
}
