//! Fixtures shared by the integration tests: minimal ELF64 images and a fake
//! procfs tree.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use usym::symbolization::{Usym, UsymConfig};

pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_DYNSYM: u32 = 11;
const SHF_ALLOC_EXEC: u64 = 0x2 | 0x4;
const STB_GLOBAL: u8 = 1;
const TEXT_SECTION_INDEX: u16 = 1;
const STRTAB_SECTION_INDEX: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct FakeSym {
    pub name: &'static str,
    pub value: u64,
    pub size: u64,
    pub st_type: u8,
}

pub fn func(name: &'static str, value: u64, size: u64) -> FakeSym {
    FakeSym { name, value, size, st_type: STT_FUNC }
}

pub fn object(name: &'static str, value: u64, size: u64) -> FakeSym {
    FakeSym { name, value, size, st_type: STT_OBJECT }
}

/// Description of a synthesized x86-64 ELF executable
pub struct FakeElf {
    pub text_addr: u64,
    pub text_size: u64,
    pub symtab: Vec<FakeSym>,
    pub dynsym: Vec<FakeSym>,
}

impl FakeElf {
    pub fn new(text_addr: u64, text_size: u64) -> Self {
        Self { text_addr, text_size, symtab: Vec::new(), dynsym: Vec::new() }
    }

    pub fn symtab(mut self, syms: &[FakeSym]) -> Self {
        self.symtab.extend_from_slice(syms);
        self
    }

    pub fn dynsym(mut self, syms: &[FakeSym]) -> Self {
        self.dynsym.extend_from_slice(syms);
        self
    }

    /// Sections: null, .text, .symtab, .strtab, .shstrtab, optional .dynsym
    pub fn build(&self) -> Vec<u8> {
        let mut strtab = vec![0u8];
        let mut name_offset = |name: &str| -> u32 {
            let offset = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
            offset
        };
        let symtab_names: Vec<u32> = self.symtab.iter().map(|s| name_offset(s.name)).collect();
        let dynsym_names: Vec<u32> = self.dynsym.iter().map(|s| name_offset(s.name)).collect();

        let mut shstrtab = vec![0u8];
        let mut section_name = |name: &str| -> u32 {
            let offset = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            offset
        };
        let text_name = section_name(".text");
        let symtab_name = section_name(".symtab");
        let strtab_name = section_name(".strtab");
        let shstrtab_name = section_name(".shstrtab");
        let dynsym_name = section_name(".dynsym");

        let mut buf = vec![0u8; 64];

        let text_off = buf.len() as u64;
        buf.resize(buf.len() + self.text_size as usize, 0);

        pad_to(&mut buf, 8);
        let symtab_off = buf.len() as u64;
        write_symbols(&mut buf, &self.symtab, &symtab_names);
        let symtab_size = buf.len() as u64 - symtab_off;

        let dynsym_off = buf.len() as u64;
        if !self.dynsym.is_empty() {
            write_symbols(&mut buf, &self.dynsym, &dynsym_names);
        }
        let dynsym_size = buf.len() as u64 - dynsym_off;

        let strtab_off = buf.len() as u64;
        buf.extend_from_slice(&strtab);

        let shstrtab_off = buf.len() as u64;
        buf.extend_from_slice(&shstrtab);

        pad_to(&mut buf, 8);
        let shoff = buf.len() as u64;

        // null section
        write_section_header(&mut buf, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0);
        write_section_header(
            &mut buf, text_name, SHT_PROGBITS, SHF_ALLOC_EXEC, self.text_addr, text_off,
            self.text_size, 0, 0, 16, 0,
        );
        write_section_header(
            &mut buf, symtab_name, SHT_SYMTAB, 0, 0, symtab_off, symtab_size,
            STRTAB_SECTION_INDEX, 1, 8, 24,
        );
        write_section_header(
            &mut buf, strtab_name, SHT_STRTAB, 0, 0, strtab_off, strtab.len() as u64, 0, 0, 1, 0,
        );
        write_section_header(
            &mut buf, shstrtab_name, SHT_STRTAB, 0, 0, shstrtab_off, shstrtab.len() as u64, 0, 0,
            1, 0,
        );
        let mut shnum = 5u16;
        if !self.dynsym.is_empty() {
            write_section_header(
                &mut buf, dynsym_name, SHT_DYNSYM, 0x2, 0, dynsym_off, dynsym_size,
                STRTAB_SECTION_INDEX, 1, 8, 24,
            );
            shnum += 1;
        }

        write_file_header(&mut buf, self.text_addr, shoff, shnum, 4);
        buf
    }
}

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

fn write_symbols(buf: &mut Vec<u8>, syms: &[FakeSym], names: &[u32]) {
    // index 0 is the null symbol
    buf.extend_from_slice(&[0u8; 24]);
    for (sym, name) in syms.iter().zip(names) {
        buf.extend_from_slice(&name.to_le_bytes());
        buf.push((STB_GLOBAL << 4) | sym.st_type);
        buf.push(0);
        buf.extend_from_slice(&TEXT_SECTION_INDEX.to_le_bytes());
        buf.extend_from_slice(&sym.value.to_le_bytes());
        buf.extend_from_slice(&sym.size.to_le_bytes());
    }
}

#[allow(clippy::too_many_arguments)]
fn write_section_header(
    buf: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    align: u64,
    entsize: u64,
) {
    buf.extend_from_slice(&name.to_le_bytes());
    buf.extend_from_slice(&sh_type.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&addr.to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&link.to_le_bytes());
    buf.extend_from_slice(&info.to_le_bytes());
    buf.extend_from_slice(&align.to_le_bytes());
    buf.extend_from_slice(&entsize.to_le_bytes());
}

fn write_file_header(buf: &mut [u8], entry: u64, shoff: u64, shnum: u16, shstrndx: u16) {
    let mut header = Vec::with_capacity(64);
    header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    header.extend_from_slice(&[0u8; 8]);
    header.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    header.extend_from_slice(&62u16.to_le_bytes()); // EM_X86_64
    header.extend_from_slice(&1u32.to_le_bytes());
    header.extend_from_slice(&entry.to_le_bytes());
    header.extend_from_slice(&0u64.to_le_bytes()); // no program headers
    header.extend_from_slice(&shoff.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&64u16.to_le_bytes());
    header.extend_from_slice(&56u16.to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&64u16.to_le_bytes());
    header.extend_from_slice(&shnum.to_le_bytes());
    header.extend_from_slice(&shstrndx.to_le_bytes());
    buf[..64].copy_from_slice(&header);
}

/// A fake `/proc` plus a fake host `/tmp`
pub struct FakeProc {
    pub proc_root: TempDir,
    pub host_tmp: TempDir,
}

impl FakeProc {
    pub fn new() -> Self {
        Self { proc_root: tempfile::tempdir().unwrap(), host_tmp: tempfile::tempdir().unwrap() }
    }

    pub fn proc_dir(&self, pid: u32) -> PathBuf {
        self.proc_root.path().join(pid.to_string())
    }

    /// `<proc>/<pid>/root`
    pub fn root(&self, pid: u32) -> PathBuf {
        self.proc_dir(pid).join("root")
    }

    /// Install an executable at `exe` inside the process root and point the
    /// `exe` link at it, the way the kernel reports it
    pub fn add_process(&self, pid: u32, exe: &str, image: &[u8], maps: &str) {
        let dir = self.proc_dir(pid);
        fs::create_dir_all(&dir).unwrap();
        symlink(exe, dir.join("exe")).unwrap();
        fs::write(dir.join("maps"), maps).unwrap();
        self.add_file(pid, exe, image);
    }

    /// Write a file at `path` as seen inside the process root
    pub fn add_file(&self, pid: u32, path: &str, contents: &[u8]) -> PathBuf {
        let full = self.root(pid).join(path.trim_start_matches('/'));
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, contents).unwrap();
        full
    }

    pub fn config(&self) -> UsymConfig {
        UsymConfig::default()
            .with_proc_root(self.proc_root.path())
            .with_host_tmp(self.host_tmp.path())
            .with_fs_timeout(Some(Duration::from_secs(10)))
    }

    pub fn resolver(&self) -> Usym {
        Usym::with_config(self.config())
    }
}

/// Rewrite a file and force its modification time, so staleness checks do
/// not depend on filesystem timestamp granularity
pub fn write_with_mtime(path: &Path, contents: &str, mtime: SystemTime) {
    fs::write(path, contents).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(mtime).unwrap();
}

pub fn epoch_plus(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Create a named pipe; opening it for reading blocks until a writer shows up
#[allow(unsafe_code)]
pub fn make_fifo(path: &Path) {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) }, 0, "mkfifo failed");
}
