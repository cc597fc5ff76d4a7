pub mod input_bar;
pub mod notification_list;
pub mod status;
pub mod toast;
