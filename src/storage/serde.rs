//! Fixed-width binary encoding shared by the index and table files.

use super::file::FileHandle;
use crate::error::{EngineError, Result};
use crate::limits::MAX_TYPE_SIZE;
use crate::types::ColumnType;
use crate::value::Value;

/// Write a length-prefixed name into a fixed-width field, zero-padded.
///
/// Layout: 1 length byte, then `width` bytes of name data (only the first
/// `length` of which are meaningful).
pub fn write_bounded_name(file: &mut FileHandle, name: &str, width: usize) -> Result<()> {
    let len = name.len();
    if len > width {
        return Err(EngineError::LimitReached);
    }
    file.write(&[len as u8])?;
    file.write(name.as_bytes())?;
    file.write_byte_n(0, width - len)
}

/// Inverse of [`write_bounded_name`].
pub fn read_bounded_name(file: &mut FileHandle, width: usize) -> Result<String> {
    let mut len_buf = [0u8; 1];
    file.read(&mut len_buf)?;
    let len = len_buf[0] as usize;
    let mut buf = vec![0u8; width];
    file.read(&mut buf)?;
    buf.truncate(len);
    String::from_utf8(buf).map_err(|_| EngineError::InvalidFile)
}

/// Write a column's declared size byte followed by its type discriminant.
pub fn write_column_type(file: &mut FileHandle, ty: ColumnType) -> Result<()> {
    file.write(&[ty.declared_size()])?;
    file.write(&[ty.discriminant()])
}

/// Inverse of [`write_column_type`].
pub fn read_column_type(file: &mut FileHandle) -> Result<ColumnType> {
    let mut size_buf = [0u8; 1];
    file.read(&mut size_buf)?;
    let mut discriminant_buf = [0u8; 1];
    file.read(&mut discriminant_buf)?;
    ColumnType::from_discriminant(discriminant_buf[0], size_buf[0]).ok_or(EngineError::InvalidFile)
}

/// Write a value into a fixed [`MAX_TYPE_SIZE`]-byte slot.
///
/// `Null` is only ever produced in memory (by `LEFT OUTER JOIN` padding) and
/// is never round-tripped through storage, but an all-zero slot is written
/// for it anyway so the writer never has to special-case a missing cell.
pub fn write_value(file: &mut FileHandle, value: &Value) -> Result<()> {
    match value {
        Value::Integer(i) => {
            file.write(&i.to_le_bytes())?;
            file.write_byte_n(0, MAX_TYPE_SIZE - 4)
        }
        Value::Float(f) => {
            file.write(&f.to_le_bytes())?;
            file.write_byte_n(0, MAX_TYPE_SIZE - 4)
        }
        Value::String(s) => {
            let len = s.len();
            if len > MAX_TYPE_SIZE - 1 {
                return Err(EngineError::LimitReached);
            }
            file.write(&[len as u8])?;
            file.write(s.as_bytes())?;
            file.write_byte_n(0, MAX_TYPE_SIZE - 1 - len)
        }
        Value::Null => file.write_byte_n(0, MAX_TYPE_SIZE),
    }
}

/// Read a value out of a fixed [`MAX_TYPE_SIZE`]-byte slot, interpreting its
/// bytes according to `ty` (the slot carries no type tag of its own).
pub fn read_value(file: &mut FileHandle, ty: ColumnType) -> Result<Value> {
    match ty {
        ColumnType::Int => {
            let mut buf = [0u8; 4];
            file.read(&mut buf)?;
            file.skip(MAX_TYPE_SIZE - 4)?;
            Ok(Value::from_int(u32::from_le_bytes(buf)))
        }
        ColumnType::Float => {
            let mut buf = [0u8; 4];
            file.read(&mut buf)?;
            file.skip(MAX_TYPE_SIZE - 4)?;
            Ok(Value::from_float(f32::from_le_bytes(buf)))
        }
        ColumnType::Varchar(_) | ColumnType::Char(_) => {
            let mut len_buf = [0u8; 1];
            file.read(&mut len_buf)?;
            let len = len_buf[0] as usize;
            let mut buf = vec![0u8; len];
            file.read(&mut buf)?;
            file.skip(MAX_TYPE_SIZE - 1 - len)?;
            let s = String::from_utf8(buf).map_err(|_| EngineError::InvalidFile)?;
            Value::from_string(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn roundtrip_file() -> (tempfile::TempDir, FileHandle) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("serde.bin");
        let mut file = FileHandle::new(path.to_str().unwrap());
        file.open(true).unwrap();
        (dir, file)
    }

    #[test]
    fn bounded_name_round_trips() {
        let (_dir, mut file) = roundtrip_file();
        write_bounded_name(&mut file, "users", 16).unwrap();
        file.seek(0).unwrap();
        assert_eq!(read_bounded_name(&mut file, 16).unwrap(), "users");
    }

    #[test]
    fn column_type_round_trips() {
        let (_dir, mut file) = roundtrip_file();
        write_column_type(&mut file, ColumnType::Varchar(20)).unwrap();
        file.seek(0).unwrap();
        assert_eq!(read_column_type(&mut file).unwrap(), ColumnType::Varchar(20));
    }

    #[test]
    fn value_round_trips_each_type() {
        let (_dir, mut file) = roundtrip_file();

        write_value(&mut file, &Value::from_int(42)).unwrap();
        file.seek(0).unwrap();
        assert!(matches!(read_value(&mut file, ColumnType::Int).unwrap(), Value::Integer(42)));

        let mut file2 = FileHandle::new(file.name().to_string() + ".2");
        file2.open(true).unwrap();
        write_value(&mut file2, &Value::from_string("hi").unwrap()).unwrap();
        file2.seek(0).unwrap();
        let v = read_value(&mut file2, ColumnType::Varchar(10)).unwrap();
        assert!(matches!(v, Value::String(s) if s == "hi"));
    }

    #[test]
    fn value_slot_is_fixed_width() {
        let (_dir, mut file) = roundtrip_file();
        write_value(&mut file, &Value::from_int(7)).unwrap();
        let pos_after_int = file_len(&file);
        assert_eq!(pos_after_int, MAX_TYPE_SIZE as u64);
    }

    fn file_len(file: &FileHandle) -> u64 {
        std::fs::metadata(file.name()).unwrap().len()
    }
}
