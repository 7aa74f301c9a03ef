//! Constructors and accessors for generated protocol types.

mod op_item_ext;
mod set_ext;

#[cfg(test)]
mod op_item_ext_test;
