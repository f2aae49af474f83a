//! Sliding history of emitted bytes, shared by the two codec directions.
//!
//! The decoder pushes every byte it produces through the window so that
//! match copies can reach back into recent output; the encoder maintains
//! the identical history so that its match search and verification replay
//! see exactly the bytes the decoder will.  The capacity is fixed by the
//! stream format and all addressing wraps modulo that capacity, including
//! a rewind of a full lap, which lands back on the cursor.

pub struct Window {
    buf: Vec<u8>,
    head: usize
}

impl Window {
    pub fn create(size: usize) -> Self {
        Self {
            buf: vec![0;size],
            head: 0
        }
    }
    /// position the next emitted byte will be recorded at
    pub fn head(&self) -> usize {
        self.head
    }
    /// record one emitted byte and advance the cursor
    pub fn push(&mut self,val: u8) {
        self.buf[self.head] = val;
        self.head = (self.head + 1) % self.buf.len();
    }
    /// position `dist` bytes behind the cursor
    pub fn rewind(&self,dist: usize) -> usize {
        (self.head + self.buf.len() - dist % self.buf.len()) % self.buf.len()
    }
    /// how far behind the cursor an absolute position lies
    pub fn distance(&self,pos: usize) -> usize {
        (self.head + self.buf.len() - pos) % self.buf.len()
    }
    /// byte at an absolute position, cursor does not move
    pub fn get(&self,pos: usize) -> u8 {
        self.buf[pos % self.buf.len()]
    }
    /// overwrite an absolute position, cursor does not move
    pub fn put(&mut self,pos: usize,val: u8) {
        let n = self.buf.len();
        self.buf[pos % n] = val;
    }
}

#[test]
fn wraps_at_capacity() {
    let mut win = Window::create(4);
    for val in 0..6u8 {
        win.push(val);
    }
    assert_eq!(win.head(),2);
    // oldest two bytes were overwritten on the second lap
    assert_eq!(win.get(0),4);
    assert_eq!(win.get(1),5);
    assert_eq!(win.get(2),2);
    assert_eq!(win.get(6),2);
}

#[test]
fn rewind_and_distance() {
    let mut win = Window::create(4);
    for val in 0..5u8 {
        win.push(val);
    }
    assert_eq!(win.rewind(1),0);
    assert_eq!(win.rewind(2),3);
    assert_eq!(win.rewind(4),1);
    assert_eq!(win.distance(3),2);
    assert_eq!(win.distance(1),0);
}
