//! Bit-level reader and writer used by the codecs.
//!
//! Symbol codes are packed MSB-first within each byte, while the extra-bits
//! fields that follow match symbols accumulate LSB-first.  Both orders are
//! part of the on-ROM stream format and must not be mixed up.

use bit_vec::BitVec;
use crate::Error;

pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

impl BitReader {
    pub fn create(dat: &[u8]) -> Self {
        Self {
            bits: BitVec::from_bytes(dat),
            ptr: 0
        }
    }
    /// get the next bit, starting from the MSB of the first byte
    pub fn read_bit(&mut self) -> Result<bool,Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => Err(Error::InputExhausted)
        }
    }
    /// read `num_bits` bits, the first bit read becomes bit 0 of the result
    pub fn read_bits(&mut self,num_bits: u16) -> Result<u32,Error> {
        let mut ans: u32 = 0;
        for b in 0..num_bits {
            if self.read_bit()? {
                ans |= 1 << b;
            }
        }
        Ok(ans)
    }
}

pub struct BitWriter {
    bits: BitVec
}

impl BitWriter {
    pub fn create() -> Self {
        Self {
            bits: BitVec::new()
        }
    }
    pub fn write_bit(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// write `num_bits` bits of `val` starting from bit 0
    pub fn write_bits(&mut self,val: u32,num_bits: u16) {
        for b in 0..num_bits {
            self.bits.push(val & (1 << b) != 0);
        }
    }
    /// pack into bytes, zero-padding the final partial byte
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }
}

#[test]
fn bit_orders() {
    let mut writer = BitWriter::create();
    writer.write_bit(true);
    writer.write_bit(false);
    writer.write_bits(0b1101,4);
    // stream is 1,0 then 1,0,1,1 -> 10101100 padded
    assert_eq!(writer.to_bytes(),vec![0xac]);

    let mut reader = BitReader::create(&[0xac]);
    assert_eq!(reader.read_bit().unwrap(),true);
    assert_eq!(reader.read_bit().unwrap(),false);
    assert_eq!(reader.read_bits(4).unwrap(),0b1101);
}

#[test]
fn exhaustion() {
    let mut reader = BitReader::create(&[0xff]);
    assert_eq!(reader.read_bits(8).unwrap(),0xff);
    assert!(matches!(reader.read_bit(),Err(Error::InputExhausted)));
}
