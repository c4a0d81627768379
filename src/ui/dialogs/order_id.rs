use std::cell::RefCell;
use std::rc::Rc;

use fltk::{
    button::Button,
    dialog,
    enums::{Align, CallbackTrigger},
    frame::Frame,
    input::Input,
    prelude::*,
    window::Window,
};

use super::run_dialog;

/// Ask for the order number shown by the checkout page once payment is done.
/// Returns `None` when the user cancels.
pub fn show_order_id_dialog() -> Option<String> {
    let mut dialog_win = Window::default()
        .with_size(380, 150)
        .with_label("Confirmar pago")
        .center_screen();
    dialog_win.make_modal(true);

    Frame::default()
        .with_pos(20, 15)
        .with_size(340, 40)
        .with_label("Cuando termines el pago, introduce\nel número de pedido:")
        .with_align(Align::Left | Align::Inside);
    let mut order_input = Input::default().with_pos(20, 60).with_size(340, 30);

    let mut ok_btn = Button::default()
        .with_pos(170, 105).with_size(90, 30).with_label("Confirmar");
    let mut cancel_btn = Button::default()
        .with_pos(270, 105).with_size(90, 30).with_label("Cancelar");

    dialog_win.end();
    dialog_win.make_resizable(false);
    dialog_win.show();

    let result: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

    let result_ok = result.clone();
    let dialog_ok = dialog_win.clone();
    let input_ok = order_input.clone();
    ok_btn.set_callback(move |_| {
        let order_id = input_ok.value().trim().to_string();
        if order_id.is_empty() {
            dialog::message_default("Introduce el número de pedido");
            return;
        }
        *result_ok.borrow_mut() = Some(order_id);
        dialog_ok.clone().hide();
    });

    // Enter key on input triggers Confirm
    let mut ok_btn2 = ok_btn.clone();
    order_input.set_trigger(CallbackTrigger::EnterKey);
    order_input.set_callback(move |_| {
        ok_btn2.do_callback();
    });

    let dialog_close = dialog_win.clone();
    cancel_btn.set_callback(move |_| {
        dialog_close.clone().hide();
    });

    let dialog_x = dialog_win.clone();
    dialog_win.set_callback(move |_| {
        dialog_x.clone().hide();
    });

    run_dialog(&dialog_win);
    result.borrow_mut().take()
}
