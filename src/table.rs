pub mod columnwidths;
pub mod rowbuffer;

pub use columnwidths::ColumnWidths;
pub use rowbuffer::RowBuffer;
