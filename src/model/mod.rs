pub mod tree;
pub mod work_item;
