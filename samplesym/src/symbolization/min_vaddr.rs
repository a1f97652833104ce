//! Module load baseline from ELF program headers
//!
//! Host resolution works in link-time virtual addresses, while samples only
//! give an offset from the mapping start. The gap is the vaddr of the
//! module's executable load segment.

use log::debug;
use object::elf::{PF_R, PF_X};
use object::{Object, ObjectSegment, SegmentFlags};

use super::strategy::{display_name, MinVaddrProvider, ModuleLocator};

/// Reads the lowest `R+X` `PT_LOAD` vaddr from the host copy of a module
#[derive(Debug, Clone, Default)]
pub struct ElfMinVaddr {
    locator: ModuleLocator,
}

impl ElfMinVaddr {
    #[must_use]
    pub fn new(locator: ModuleLocator) -> Self {
        Self { locator }
    }
}

impl MinVaddrProvider for ElfMinVaddr {
    fn min_vaddr(&self, module: &str) -> u64 {
        let data = match self.locator.read(module) {
            Ok(data) => data,
            Err(failure) => {
                debug!("min vaddr of {}: {failure:?}", display_name(&self.locator.locate(module)));
                return 0;
            }
        };
        match object::File::parse(&*data) {
            Ok(obj) => min_executable_vaddr(&obj).unwrap_or(0),
            Err(e) => {
                debug!("min vaddr of {module}: {e}");
                0
            }
        }
    }
}

/// Lowest address among read+execute load segments
#[must_use]
pub fn min_executable_vaddr(obj: &object::File<'_>) -> Option<u64> {
    obj.segments()
        .filter(|segment| match segment.flags() {
            SegmentFlags::Elf { p_flags } => p_flags & (PF_R | PF_X) == (PF_R | PF_X),
            _ => false,
        })
        .map(|segment| segment.address())
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_module_is_zero() {
        let provider = ElfMinVaddr::default();
        assert_eq!(provider.min_vaddr("/no/such/module.so"), 0);
    }

    #[test]
    fn test_non_elf_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.so");
        std::fs::write(&path, [0u8; 64]).expect("write");
        let provider = ElfMinVaddr::default();
        assert_eq!(provider.min_vaddr(&path.to_string_lossy()), 0);
    }

    #[test]
    fn test_own_executable_has_text_segment() {
        // The test binary is an ELF file with at least one R+X load segment
        let exe = std::env::current_exe().expect("current exe");
        let data = std::fs::read(&exe).expect("read exe");
        let obj = object::File::parse(&*data).expect("parse exe");
        assert!(min_executable_vaddr(&obj).is_some());
    }
}
