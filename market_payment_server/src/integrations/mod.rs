pub mod tosspay;
