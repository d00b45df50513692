mod db;
pub use db::*;

mod view;
pub use view::*;
