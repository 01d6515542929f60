//! Minimal kernel type layouts for the LSM hooks.
//!
//! Generated with `aya-tool generate linux_binprm file`, trimmed to the
//! fields the programs actually dereference; the leading fields each hook
//! never touches are collapsed into padding. Field offsets are fixed up at
//! program load time via BTF relocations.

#![allow(non_camel_case_types, dead_code)]

use aya_ebpf::cty::{c_char, c_void};

#[repr(C)]
pub struct path {
    pub mnt: *const c_void,
    pub dentry: *const c_void,
}

#[repr(C)]
pub struct file {
    pub _pad0: [u8; 16],
    pub f_path: path,
    pub _rest: [u8; 0],
}

#[repr(C)]
pub struct linux_binprm {
    pub _pad0: [u8; 64],
    pub filename: *const c_char,
    pub interp: *const c_char,
    pub fdpath: *const c_char,
}
