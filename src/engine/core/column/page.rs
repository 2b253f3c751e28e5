/// Wire views of columns, shaped like the response pages the external query
/// server puts on the Thrift wire. Varchar carries a contiguous byte payload
/// with per-row sizes; every page carries a per-row null flag vector.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPage {
    Varchar(VarcharPage),
    Integer(IntegerPage),
    Bigint(BigintPage),
    Double(DoublePage),
    Boolean(BooleanPage),
    Timestamp(TimestampPage),
}

impl ColumnPage {
    pub fn row_count(&self) -> usize {
        match self {
            ColumnPage::Varchar(p) => p.nulls.len(),
            ColumnPage::Integer(p) => p.nulls.len(),
            ColumnPage::Bigint(p) => p.nulls.len(),
            ColumnPage::Double(p) => p.nulls.len(),
            ColumnPage::Boolean(p) => p.nulls.len(),
            ColumnPage::Timestamp(p) => p.nulls.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarcharPage {
    pub bytes: Vec<u8>,
    pub sizes: Vec<i32>,
    pub nulls: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerPage {
    pub ints: Vec<i32>,
    pub nulls: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BigintPage {
    pub longs: Vec<i64>,
    pub nulls: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoublePage {
    pub doubles: Vec<f64>,
    pub nulls: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanPage {
    pub booleans: Vec<bool>,
    pub nulls: Vec<bool>,
}

/// Timestamps travel as unix milliseconds on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampPage {
    pub timestamps: Vec<i64>,
    pub nulls: Vec<bool>,
}
