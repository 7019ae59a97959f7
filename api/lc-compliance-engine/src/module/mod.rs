pub mod lc_check;
