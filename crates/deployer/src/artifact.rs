//! Loading of the compiled contract artifacts: the JSON ABI and the hex
//! encoded creation bytecode, as emitted by `solc --abi --bin`.

use {
    alloy::{
        dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
        json_abi::JsonAbi,
        primitives::{Bytes, hex},
    },
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// The ABI and bytecode of one contract. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    abi: JsonAbi,
    bytecode: Bytecode,
}

impl ArtifactPair {
    pub fn new(abi: JsonAbi, bytecode: Bytecode) -> Self {
        Self { abi, bytecode }
    }

    /// Reads and parses both artifact files. Nothing is sent anywhere; any
    /// error here means the deployment must not be attempted.
    pub fn load(bytecode: &Path, abi: &Path) -> Result<Self, Error> {
        let bytecode_text = read(bytecode)?;
        let abi_text = read(abi)?;

        let bytecode = Bytecode::parse(&bytecode_text).map_err(|source| Error::Bytecode {
            path: bytecode.to_owned(),
            source,
        })?;
        let abi = serde_json::from_str::<JsonAbi>(&abi_text).map_err(|source| Error::Abi {
            path: abi.to_owned(),
            source,
        })?;

        tracing::debug!(
            bytes = bytecode.code().len(),
            functions = abi.functions().count(),
            events = abi.events().count(),
            "loaded contract artifacts"
        );
        Ok(Self { abi, bytecode })
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    /// The transaction payload creating the contract: the bytecode followed by
    /// the ABI encoded constructor arguments.
    ///
    /// Arguments are given in their textual form (`42`, `0xabc…`, `[1,2]`,
    /// `(true,"x")`) and are parsed against the constructor's input types.
    pub fn creation_code(&self, args: &[String]) -> Result<Bytes, Error> {
        let encoded = match self.abi.constructor() {
            None if args.is_empty() => Vec::new(),
            None => {
                return Err(Error::ArgumentCount {
                    expected: 0,
                    actual: args.len(),
                });
            }
            Some(constructor) => {
                if constructor.inputs.len() != args.len() {
                    return Err(Error::ArgumentCount {
                        expected: constructor.inputs.len(),
                        actual: args.len(),
                    });
                }
                let values = constructor
                    .inputs
                    .iter()
                    .zip(args)
                    .enumerate()
                    .map(|(index, (param, arg))| {
                        let invalid = |source| Error::Argument {
                            index,
                            ty: param.selector_type().into_owned(),
                            source,
                        };
                        param.resolve().map_err(invalid)?.coerce_str(arg).map_err(invalid)
                    })
                    .collect::<Result<Vec<DynSolValue>, _>>()?;
                constructor
                    .abi_encode_input(&values)
                    .map_err(Error::Encoding)?
            }
        };

        Ok([self.bytecode.code().as_ref(), encoded.as_slice()]
            .concat()
            .into())
    }
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })
}

/// Contract creation bytecode, kept both as the text it was read from and as
/// decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode {
    text: String,
    code: Bytes,
}

impl Bytecode {
    /// Parses hex encoded bytecode. Surrounding whitespace and the `0x`
    /// prefix are optional.
    pub fn parse(text: &str) -> Result<Self, BytecodeError> {
        let text = text.trim();
        let digits = text.strip_prefix("0x").unwrap_or(text);
        if digits.is_empty() {
            return Err(BytecodeError::Empty);
        }
        // solc leaves `__$<hash>$__` placeholders where library addresses
        // must be linked in.
        if let Some(start) = digits.find("__") {
            let placeholder = digits[start..].chars().take(40).collect();
            return Err(BytecodeError::UnlinkedLibrary(placeholder));
        }
        let code = hex::decode(digits)?;
        Ok(Self {
            text: text.to_string(),
            code: code.into(),
        })
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn code(&self) -> &Bytes {
        &self.code
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BytecodeError {
    #[error("bytecode is empty")]
    Empty,
    #[error("bytecode contains the unlinked library placeholder {0}")]
    UnlinkedLibrary(String),
    #[error("bytecode is not valid hex")]
    Hex(#[from] hex::FromHexError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed ABI in {path:?}")]
    Abi {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("malformed bytecode in {path:?}")]
    Bytecode {
        path: PathBuf,
        source: BytecodeError,
    },
    #[error("the constructor takes {expected} argument(s) but {actual} were given")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("constructor argument #{index} is not a valid {ty}")]
    Argument {
        index: usize,
        ty: String,
        source: alloy::dyn_abi::Error,
    },
    #[error("failed to encode constructor arguments")]
    Encoding(#[source] alloy::dyn_abi::Error),
}

impl Error {
    /// Whether the artifact could not be read at all, as opposed to being
    /// read but malformed.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{U256, address},
        rstest::rstest,
        std::io::Write,
        tempfile::NamedTempFile,
    };

    const ERC20_ABI: &str = r#"[
        {"type":"constructor","inputs":[{"name":"supply","type":"uint256","internalType":"uint256"},{"name":"owner","type":"address","internalType":"address"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"balanceOf","inputs":[{"name":"account","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
    ]"#;

    fn file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_abi_and_bytecode() {
        let bytecode = file("0x6001600c60003960016000f300\n");
        let abi = file(ERC20_ABI);

        let artifacts = ArtifactPair::load(bytecode.path(), abi.path()).unwrap();

        assert_eq!(artifacts.bytecode().as_text(), "0x6001600c60003960016000f300");
        assert_eq!(artifacts.bytecode().code().len(), 13);
        assert!(artifacts.abi().constructor().is_some());
        assert_eq!(artifacts.abi().functions().count(), 1);
        assert_eq!(artifacts.abi().events().count(), 1);
    }

    #[test]
    fn missing_bytecode_file_is_io_error() {
        let abi = file("[]");
        let err = ArtifactPair::load(Path::new("/nonexistent/Contract.bin"), abi.path())
            .unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("Contract.bin"));
    }

    #[test]
    fn missing_abi_file_is_io_error() {
        let bytecode = file("00");
        let err = ArtifactPair::load(bytecode.path(), Path::new("/nonexistent/Contract.abi"))
            .unwrap_err();
        assert!(err.is_io());
    }

    #[rstest]
    #[case::truncated(r#"[{"type":"function","name":"f""#)]
    #[case::not_a_list(r#"{"abi":[]}"#)]
    #[case::parameter_without_type(
        r#"[{"type":"function","name":"f","inputs":[{"name":"a"}],"outputs":[],"stateMutability":"view"}]"#
    )]
    #[case::unknown_entry_type(r#"[{"type":"banana","name":"f"}]"#)]
    fn malformed_abi_is_rejected(#[case] abi: &str) {
        let bytecode = file("00");
        let abi = file(abi);
        let err = ArtifactPair::load(bytecode.path(), abi.path()).unwrap_err();
        assert!(matches!(err, Error::Abi { .. }), "{err:?}");
    }

    #[rstest]
    #[case::prefixed("0x6080", &[0x60, 0x80])]
    #[case::bare("6080", &[0x60, 0x80])]
    #[case::surrounding_whitespace("  0x6080\n", &[0x60, 0x80])]
    fn parses_bytecode(#[case] text: &str, #[case] expected: &[u8]) {
        assert_eq!(Bytecode::parse(text).unwrap().code().as_ref(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_prefix("0x\n")]
    #[case::odd_length("0x608")]
    #[case::not_hex("0xzz")]
    #[case::unlinked("6080__$1234567890abcdef1234567890abcdef12$__6080")]
    #[case::non_ascii("0x60é80")]
    #[case::non_ascii_in_placeholder("6080__aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaé")]
    fn rejects_bytecode(#[case] text: &str) {
        assert!(Bytecode::parse(text).is_err());
    }

    #[test]
    fn unlinked_library_names_placeholder() {
        let err = Bytecode::parse("6080__$1234567890abcdef1234567890abcdef12$__6080").unwrap_err();
        assert!(matches!(err, BytecodeError::UnlinkedLibrary(placeholder) if placeholder.starts_with("__$1234")));
    }

    #[test]
    fn unlinked_placeholder_is_cut_at_a_character() {
        let text = format!("6080__{}é00", "a".repeat(37));
        let err = Bytecode::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            BytecodeError::UnlinkedLibrary(placeholder) if placeholder == format!("__{}é", "a".repeat(37))
        ));
    }

    fn pair(abi: &str) -> ArtifactPair {
        ArtifactPair::new(
            serde_json::from_str(abi).unwrap(),
            Bytecode::parse("0x6080").unwrap(),
        )
    }

    #[test]
    fn creation_code_without_constructor_is_bytecode() {
        let artifacts = pair("[]");
        assert_eq!(artifacts.creation_code(&[]).unwrap().as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn creation_code_appends_encoded_constructor_arguments() {
        let artifacts = pair(ERC20_ABI);
        let owner = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

        let code = artifacts
            .creation_code(&["1000".to_string(), owner.to_string()])
            .unwrap();

        let mut expected = vec![0x60, 0x80];
        expected.extend_from_slice(&U256::from(1000).to_be_bytes::<32>());
        expected.extend_from_slice(&[0; 12]);
        expected.extend_from_slice(owner.as_slice());
        assert_eq!(code.as_ref(), expected.as_slice());
    }

    #[test]
    fn constructor_argument_count_must_match() {
        let err = pair(ERC20_ABI)
            .creation_code(&["1000".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentCount {
                expected: 2,
                actual: 1
            }
        ));

        let err = pair("[]").creation_code(&["1".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentCount {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[test]
    fn constructor_argument_must_match_type() {
        let err = pair(ERC20_ABI)
            .creation_code(&["1000".to_string(), "not an address".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::Argument { index: 1, ref ty, .. } if ty == "address"));
    }
}
