//! Architecture identification.
//!
//! The metadata's `aux.arch` value is a free-form string written by the dumping tool.
//! `Arch` keeps that string and decodes the common spellings into the `object` crate's
//! `Architecture` so consumers can pick a disassembler backend, word size and byte order.

use object::{Architecture, Endianness};

/// The architecture of a dumped executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arch {
    name: String,
    architecture: Architecture,
    endianness: Option<Endianness>,
}

impl Arch {
    /// Decodes an architecture name. Unrecognised names are kept with
    /// `Architecture::Unknown` and no byte order.
    pub fn from_name(name: &str) -> Self {
        let (architecture, endianness) = decode(&name.trim().to_ascii_lowercase());
        if architecture == Architecture::Unknown {
            tracing::warn!("Unrecognised architecture {:?}", name);
        }
        Self {
            name: name.to_string(),
            architecture,
            endianness,
        }
    }

    /// The name as written in the metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    /// Native word size in bytes.
    pub fn word_size(&self) -> Option<u8> {
        self.architecture.address_size().map(|size| size.bytes())
    }

    pub fn is_known(&self) -> bool {
        self.architecture != Architecture::Unknown
    }
}

fn decode(name: &str) -> (Architecture, Option<Endianness>) {
    use Endianness::{Big, Little};

    let (architecture, endianness) = match name {
        "x86_64" | "x86-64" | "amd64" | "i386:x86-64" => (Architecture::X86_64, Little),
        "i386" | "i486" | "i586" | "i686" | "x86" | "ia32" => (Architecture::I386, Little),
        "aarch64" | "arm64" => (Architecture::Aarch64, Little),
        "aarch64_be" => (Architecture::Aarch64, Big),
        "arm" | "armv7" | "armel" | "armhf" => (Architecture::Arm, Little),
        "armeb" => (Architecture::Arm, Big),
        "mips" => (Architecture::Mips, Big),
        "mipsel" => (Architecture::Mips, Little),
        "mips64" => (Architecture::Mips64, Big),
        "mips64el" => (Architecture::Mips64, Little),
        "powerpc" | "ppc" => (Architecture::PowerPc, Big),
        "powerpc64" | "ppc64" => (Architecture::PowerPc64, Big),
        "powerpc64le" | "ppc64le" => (Architecture::PowerPc64, Little),
        "riscv32" => (Architecture::Riscv32, Little),
        "riscv64" => (Architecture::Riscv64, Little),
        "s390x" => (Architecture::S390x, Big),
        "sparc" => (Architecture::Sparc, Big),
        "sparc64" | "sparcv9" => (Architecture::Sparc64, Big),
        "loongarch64" => (Architecture::LoongArch64, Little),
        "m68k" => (Architecture::M68k, Big),
        _ => return (Architecture::Unknown, None),
    };
    (architecture, Some(endianness))
}
