mod arena;
mod handle;
pub(crate) mod node;
mod raw_ordered_map;

pub(crate) use handle::Handle;
pub(crate) use raw_ordered_map::RawOrderedMap;
