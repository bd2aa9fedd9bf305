pub mod menu;
pub mod number_display;
pub mod score_view;
pub mod word_table;
