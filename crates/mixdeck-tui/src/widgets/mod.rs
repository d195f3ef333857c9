pub mod control_card;
pub mod status_indicator;
