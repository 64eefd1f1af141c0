pub mod correlation;
pub mod coverage;
pub mod digest;
pub mod matcher;
pub mod peptide;
pub mod profile;
pub mod reduce;
pub mod report;
pub mod session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A zero-length protein was supplied to an operation requiring positions
    EmptyProtein,
    /// A protein sequence contains a character outside the amino acid alphabet
    InvalidResidue { residue: char, position: usize },
    /// A peptide's span falls outside `[1, protein_len]`. Spans are never
    /// clamped, since clamping would falsify coverage.
    PeptideOutOfRange {
        start: u32,
        end: u32,
        protein_len: u32,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProtein => write!(f, "protein sequence is empty"),
            Self::InvalidResidue { residue, position } => {
                write!(f, "invalid residue '{}' at position {}", residue, position)
            }
            Self::PeptideOutOfRange {
                start,
                end,
                protein_len,
            } => write!(
                f,
                "peptide span [{}, {}] outside protein range [1, {}]",
                start, end, protein_len
            ),
        }
    }
}

impl std::error::Error for Error {}
