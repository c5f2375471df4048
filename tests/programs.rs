use chip8::{Chip8, Config, Fault, Keypad, Status, TimerMode};
use std::io::Write;

fn rom(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes().to_vec()).collect()
}

fn run(words: &[u16]) -> Chip8 {
    let mut vm = Chip8::new(&rom(words)).unwrap();
    assert_eq!(vm.run_to_completion(|| None), Status::Halted);
    vm
}

#[test]
fn clear_resets_all_pixels() {
    let vm = run(&[0xD015, 0x00E0]);
    assert!(!vm.is_pixel_set(0, 0));
    assert!(!vm.is_pixel_set(63, 0));
    assert!(!vm.is_pixel_set(0, 31));
    assert!(!vm.is_pixel_set(63, 31));
}

#[test]
fn return_from_subroutine() {
    let vm = run(&[0x2204, 0x00EE, 0x00EE]);
    assert_eq!(vm.program_counter(), 0x202);
    assert_eq!(vm.stack_depth(), 0);
}

#[test]
fn jump_skips_over_code() {
    let vm = run(&[0x1204, 0x00EE, 0x00EE]);
    assert_eq!(vm.program_counter(), 0x204);
}

#[test]
fn call_without_return_runs_into_empty_memory() {
    let vm = run(&[0x2204, 0x00EE]);
    assert_eq!(vm.program_counter(), 0x204);
    assert_eq!(vm.stack_depth(), 1);
}

#[test]
fn skip_if_equal_to_byte() {
    let vm = run(&[0x6012, 0x3012, 0x00EE, 0x00EE]);
    assert_eq!(vm.program_counter(), 0x206);
}

#[test]
fn skip_if_not_equal_to_byte() {
    let vm = run(&[0x6012, 0x4012, 0x00EE, 0x00EE]);
    assert_eq!(vm.program_counter(), 0x204);
}

#[test]
fn multiply_by_repeated_addition() {
    // V0 = 7 * 6 with a subroutine doing the adds
    let vm = run(&[
        0x6106, // V1 = 6 (counter)
        0x620A, // V2 = 10
        0x220E, // loop: CALL add
        0x71FF, // V1 -= 1
        0x3100, // skip if V1 == 0
        0x1204, // JP loop
        0x00EE, // done
        0x7007, // add: V0 += 7
        0x00EE,
    ]);
    assert_eq!(vm.registers()[0], 42);
    assert_eq!(vm.registers()[2], 10);
}

#[test]
fn bcd_digits_read_back() {
    let vm = run(&[0x60FE, 0xA300, 0xF033, 0xF265, 0x00EE]);
    assert_eq!(&vm.registers()[..3], &[2, 5, 4]);
}

#[test]
fn draws_every_font_glyph_side_by_side() {
    // glyphs 0 through B along the top row, five pixels apart
    let vm = run(&[
        0x6000, 0x6100, 0x6200, // V0 glyph, V1 x, V2 y
        0xF029, // loop: I = glyph V0
        0xD125, // draw at (V1, V2)
        0x7001, // V0 += 1
        0x7105, // V1 += 5
        0x300C, // skip if V0 == 12
        0x1206, // JP loop
        0x00EE,
    ]);
    let fb = vm.framebuffer();
    // glyph 1 is 0x20 0x60 0x20 0x20 0x70: column 2 of its cell is lit on every row
    for y in 0..5 {
        assert!(fb.is_set(5 + 2, y));
    }
    assert_eq!(vm.registers()[0xF], 0);
    assert!(fb.lit_count() > 0);
}

#[test]
fn self_modifying_program() {
    // store 0x60 0x99 over the halt at 0x208, which then runs as V0 = 0x99
    let vm = run(&[0x6060, 0x6199, 0xA208, 0xF155, 0x00EE]);
    assert_eq!(vm.registers()[0], 0x99);
    assert_eq!(vm.program_counter(), 0x20A);
}

#[test]
fn wait_for_key_driven_by_provider() {
    let mut vm = Chip8::new(&rom(&[0xF50A, 0x00EE])).unwrap();
    let mut polls = 0;
    let status = vm.run_to_completion(|| {
        polls += 1;
        if polls < 5 {
            None
        } else {
            Some(vec![0x4].into_iter().collect::<Keypad>())
        }
    });
    assert_eq!(status, Status::Halted);
    assert_eq!(polls, 6);
    assert_eq!(vm.registers()[5], 0x4);
}

#[test]
fn runaway_recursion_faults() {
    let mut vm = Chip8::new(&rom(&[0x7001, 0x2200])).unwrap();
    assert_eq!(
        vm.run_to_completion(|| None),
        Status::Faulted(Fault::StackOverflow {
            pc: 0x202,
            depth: 12
        })
    );
    assert_eq!(vm.registers()[0], 13);
}

#[test]
fn small_memory_keeps_layout_consistent() {
    let config = Config::default().with_memory_size(1024);
    let mut vm = Chip8::with_config(config, &rom(&[0x6007, 0xA280, 0xF033, 0x00EE])).unwrap();
    let layout = vm.layout();
    assert_eq!(layout.display_start(), 1024 - 256);
    assert_eq!(layout.call_stack_start(), 1024 - 256 - 96);
    assert_eq!(vm.run_to_completion(|| None), Status::Halted);
    assert_eq!(&vm.memory()[0x280..0x283], &[0, 0, 7]);

    // I = 0x2A0 is the start of the stack region on this machine
    let mut vm = Chip8::with_config(config, &rom(&[0xA2A0, 0xF065])).unwrap();
    assert_eq!(
        vm.run_to_completion(|| None),
        Status::Faulted(Fault::ReservedMemory { address: 0x2A0 })
    );
}

#[test]
fn out_of_bounds_store_faults_before_writing() {
    let config = Config::default().with_timer_mode(TimerMode::External);
    let mut vm = Chip8::with_config(config, &rom(&[0x6E01, 0xAFF2, 0xFF55])).unwrap();
    let status = vm.run_to_completion(|| None);
    assert_eq!(
        status,
        Status::Faulted(Fault::MemoryOutOfBounds { address: 0xFF2 })
    );
    assert!(vm.memory()[0xFF2..].iter().all(|&b| b == 0));
    assert_eq!(vm.delay_timer(), 60);
}

#[test]
fn load_game_reads_rom_from_disk() {
    let path = std::env::temp_dir().join(format!("chip8-load-{}.ch8", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&[0x6A, 0x42, 0x00, 0xEE]).unwrap();
    drop(file);

    let mut vm = Chip8::load_game(Config::default(), &path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(vm.run_to_completion(|| None), Status::Halted);
    assert_eq!(vm.registers()[0xA], 0x42);
}

#[test]
fn load_game_reports_missing_file() {
    let err = Chip8::load_game(Config::default(), "/nonexistent/game.ch8").err();
    assert!(matches!(err, Some(chip8::Error::Io(_))));
}
