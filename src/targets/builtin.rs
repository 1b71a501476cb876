//! Built-in leaf targets.

use std::any::Any;

use crate::error::PropertyError;
use crate::layouts::{Layout, SimpleLayout};
use crate::properties::{
    coerce, coerce_bool, find_kind, is_member, Configurable, PropertyKind,
};
use crate::targets::{Target, TargetShape};

/// Writes formatted events to standard output or standard error.
#[derive(Debug, Default)]
pub struct ConsoleTarget {
    name: Option<String>,
    layout: Option<Box<dyn Layout>>,
    stderr: bool,
}

impl ConsoleTarget {
    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn stderr(&self) -> bool {
        self.stderr
    }
}

impl Configurable for ConsoleTarget {
    fn type_name(&self) -> &'static str {
        "console"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("layout", PropertyKind::Layout),
                ("stderr", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "stderr") {
            self.stderr = coerce_bool(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        if is_member(name, "layout") {
            self.layout = Some(layout);
            return Ok(());
        }
        Err(PropertyError::NotALayout {
            name: name.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for ConsoleTarget {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Leaf
    }
}

/// Appends formatted events to a file.
///
/// The path is itself a layout value, so it may contain deferred
/// expressions resolved per event by the runtime.
#[derive(Debug)]
pub struct FileTarget {
    name: Option<String>,
    file_name: Option<Box<dyn Layout>>,
    layout: Option<Box<dyn Layout>>,
    append: bool,
    buffer_size: usize,
    auto_flush: bool,
    create_dirs: bool,
}

impl Default for FileTarget {
    fn default() -> Self {
        FileTarget {
            name: None,
            file_name: None,
            layout: None,
            append: true,
            buffer_size: 32 * 1024,
            auto_flush: true,
            create_dirs: true,
        }
    }
}

impl FileTarget {
    pub fn file_name(&self) -> Option<&dyn Layout> {
        self.file_name.as_deref()
    }

    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn append(&self) -> bool {
        self.append
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    pub fn create_dirs(&self) -> bool {
        self.create_dirs
    }
}

impl Configurable for FileTarget {
    fn type_name(&self) -> &'static str {
        "file"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("file_name", PropertyKind::Layout),
                ("layout", PropertyKind::Layout),
                ("append", PropertyKind::Text),
                ("buffer_size", PropertyKind::Text),
                ("auto_flush", PropertyKind::Text),
                ("create_dirs", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "file_name") {
            self.file_name = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "append") {
            self.append = coerce_bool(name, value)?;
        } else if is_member(name, "buffer_size") {
            self.buffer_size = coerce(name, value)?;
        } else if is_member(name, "auto_flush") {
            self.auto_flush = coerce_bool(name, value)?;
        } else if is_member(name, "create_dirs") {
            self.create_dirs = coerce_bool(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        if is_member(name, "file_name") {
            self.file_name = Some(layout);
        } else if is_member(name, "layout") {
            self.layout = Some(layout);
        } else {
            return Err(PropertyError::NotALayout {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for FileTarget {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Leaf
    }
}

/// Keeps formatted events in a bounded in-memory buffer.
#[derive(Debug)]
pub struct MemoryTarget {
    name: Option<String>,
    layout: Option<Box<dyn Layout>>,
    capacity: usize,
}

impl Default for MemoryTarget {
    fn default() -> Self {
        MemoryTarget {
            name: None,
            layout: None,
            capacity: 1000,
        }
    }
}

impl MemoryTarget {
    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Configurable for MemoryTarget {
    fn type_name(&self) -> &'static str {
        "memory"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("layout", PropertyKind::Layout),
                ("capacity", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "capacity") {
            self.capacity = coerce(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        if is_member(name, "layout") {
            self.layout = Some(layout);
            return Ok(());
        }
        Err(PropertyError::NotALayout {
            name: name.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for MemoryTarget {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Leaf
    }
}

/// Discards events, optionally formatting them first.
#[derive(Debug, Default)]
pub struct NullTarget {
    name: Option<String>,
    layout: Option<Box<dyn Layout>>,
    format_message: bool,
}

impl NullTarget {
    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn format_message(&self) -> bool {
        self.format_message
    }
}

impl Configurable for NullTarget {
    fn type_name(&self) -> &'static str {
        "null"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("layout", PropertyKind::Layout),
                ("format_message", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "layout") {
            self.layout = Some(Box::new(SimpleLayout::new(value)));
        } else if is_member(name, "format_message") {
            self.format_message = coerce_bool(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn set_layout(&mut self, name: &str, layout: Box<dyn Layout>) -> Result<(), PropertyError> {
        if is_member(name, "layout") {
            self.layout = Some(layout);
            return Ok(());
        }
        Err(PropertyError::NotALayout {
            name: name.to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for NullTarget {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Leaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_target_defaults() {
        let target = FileTarget::default();
        assert!(target.append());
        assert!(target.auto_flush());
        assert_eq!(target.buffer_size(), 32 * 1024);
    }

    #[test]
    fn file_name_accepts_deferred_expressions() {
        let mut target = FileTarget::default();
        target.set_text("file_name", "logs/${shortdate}.log").unwrap();
        assert_eq!(
            target.file_name().unwrap().source(),
            Some("logs/${shortdate}.log")
        );
    }

    #[test]
    fn numeric_coercion_failure_is_reported() {
        let mut target = MemoryTarget::default();
        let err = target.set_text("capacity", "many").unwrap_err();
        assert!(matches!(err, PropertyError::Invalid { .. }));
    }

    #[test]
    fn console_rejects_unknown_members() {
        let mut target = ConsoleTarget::default();
        assert!(target.set_text("color", "blue").is_err());
    }
}
