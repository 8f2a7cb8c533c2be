use crate::helpers::*;
use common::asm::Reg;
use common::constants::PC_START;
use common::misc::ToU16P;
use obj::Image;

// Loading words at an origin and reading memory back gives the same words
// in host order, whatever the wire order was.
#[test]
fn load_round_trips_byte_order() {
    let words = vec![0x1234, 0xabcd, 0x00ff];
    let image = Image {
        origin: 0x3000,
        words: words.clone(),
    };
    let mut raw = Vec::new();
    image.write_to(&mut raw).unwrap();

    // Big-endian on the wire.
    assert_eq!(raw[0..2], [0x30, 0x00]);
    assert_eq!(raw[2..4], [0x12, 0x34]);

    let image = Image::read_from(&mut raw.as_slice()).unwrap();
    let (mut emu, _console) = emu_with(&[]);
    emu.load_image(&image);
    for (i, word) in words.iter().enumerate() {
        assert_eq!(emu.mem_read(0x3000 + i.to_u16p()), *word);
    }
}

#[test]
fn load_truncates_at_end_of_memory() {
    let (mut emu, _console) = emu_with(&[]);
    emu.load_words(&[1, 2, 3], 0xffff);
    assert_eq!(emu.mem_read(0xffff), 1);
    // Nothing wrapped around to the bottom of memory.
    assert_eq!(emu.mem_read(0x0000), 0);
    assert_eq!(emu.mem_read(0x0001), 0);
}

#[test]
fn loaded_image_runs() {
    let image = Image {
        origin: PC_START,
        words: vec![add_imm(Reg::R0, Reg::R0, 9), halt()],
    };
    let (mut emu, _console) = emu_with(&[]);
    emu.load_image(&image);
    emu.run_at(PC_START).unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 9);
}
