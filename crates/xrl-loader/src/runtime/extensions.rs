//! Instance extension reconciliation.
//!
//! The caller assembles a candidate list from several sources (loader-owned
//! extensions, layers); the runtime's own report is authoritative for every
//! extension it implements.

use std::collections::HashSet;

use xrl_abi::pfn::PfnEnumerateInstanceExtensionProperties;
use xrl_abi::{ExtensionProperties, Instance, XrResult};

use super::proc_addr::ProcAddr;

pub const ENUMERATE_FUNCTION_NAME: &str = "xrEnumerateInstanceExtensionProperties";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionProperty {
    pub name: String,
    pub version: u32,
}

impl ExtensionProperty {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl From<&ExtensionProperties> for ExtensionProperty {
    fn from(props: &ExtensionProperties) -> Self {
        Self::new(props.name(), props.extension_version)
    }
}

/// Merge the runtime's report into `candidates`.
///
/// Names the runtime reports overwrite the candidate's version; names only the
/// runtime reports are appended in runtime order. Candidate order is kept and
/// candidate-only entries are left as supplied. Matching is exact.
pub fn reconcile(candidates: &mut Vec<ExtensionProperty>, runtime: &[ExtensionProperty]) {
    for reported in runtime {
        match candidates.iter_mut().find(|c| c.name == reported.name) {
            Some(existing) => existing.version = reported.version,
            None => candidates.push(reported.clone()),
        }
    }
}

/// Ask the runtime for its instance extensions (count, then fill).
pub fn enumerate_runtime_extensions(proc_addr: &ProcAddr) -> Result<Vec<ExtensionProperty>, XrResult> {
    let enumerate: PfnEnumerateInstanceExtensionProperties =
        unsafe { proc_addr.resolve_as(Instance::NULL, ENUMERATE_FUNCTION_NAME)? };

    let mut count = 0u32;
    let res = unsafe { enumerate(std::ptr::null(), 0, &mut count, std::ptr::null_mut()) };
    if res.is_failure() {
        return Err(res);
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut props = vec![ExtensionProperties::empty(); count as usize];
    let capacity = count;
    let res = unsafe { enumerate(std::ptr::null(), capacity, &mut count, props.as_mut_ptr()) };
    if res.is_failure() {
        return Err(res);
    }
    props.truncate(count as usize);

    Ok(props.iter().map(ExtensionProperty::from).collect())
}

/// Extension names the bound runtime supports, captured once at load time.
#[derive(Debug, Default, Clone)]
pub struct SupportedExtensions {
    names: HashSet<String>,
}

impl SupportedExtensions {
    pub fn from_properties(props: &[ExtensionProperty]) -> Self {
        Self {
            names: props.iter().map(|p| p.name.clone()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
