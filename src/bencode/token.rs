/// A single lexical unit of bencode. Byte strings borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Integer(i64),
    ByteString(&'a [u8]),
    ListStart,
    DictStart,
    /// The structural `e` closing a list or dictionary.
    End,
}

/// A token together with the offset of its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub offset: usize,
}
