pub mod merton;
