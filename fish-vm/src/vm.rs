//! The dispatch loop: the IP, its heading, the stack-of-stacks, and the
//! per-tick instruction semantics.

use std::mem;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;

use crate::error::VmError;
use crate::glyph::{self, Category};
use crate::grid::Grid;
use crate::io::Io;
use crate::rational::Rational;
use crate::stack::Stack;

const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// A running ><> program: its code grid, instruction pointer, and the
/// full stack machine state.
///
/// `register`/`registers` and `stacks` track the register and the
/// stack-of-stacks in lockstep: `[` pushes onto both, `]` pops from
/// both, so they are always either both empty or both the same depth.
pub struct Vm {
    grid: Grid,
    pos: (i64, i64),
    dir: (i64, i64),
    stack: Stack,
    stacks: Vec<Stack>,
    register: Option<Rational>,
    registers: Vec<Option<Rational>>,
    skip: bool,
    slurp: Option<u32>,
    rng: Option<StdRng>,
}

impl Vm {
    /// Builds a VM ready to run `grid`, starting at `(0, 0)` heading
    /// right, with `initial_stack` as the current value stack.
    ///
    /// `rng` is the PRNG backing the `x` mirror; pass `None` to make `x`
    /// a no-op (the `--no-prng` policy).
    pub fn new(grid: Grid, initial_stack: Stack, rng: Option<StdRng>) -> Self {
        Vm {
            grid,
            pos: (0, 0),
            dir: (1, 0),
            stack: initial_stack,
            stacks: Vec::new(),
            register: None,
            registers: Vec::new(),
            skip: false,
            slurp: None,
            rng,
        }
    }

    /// Runs until `;` terminates the program, returning the final
    /// current value stack.
    ///
    /// # Errors
    /// Any [`VmError`] raised by an instruction propagates immediately;
    /// the VM does not attempt to recover.
    pub fn run(&mut self, io: &mut dyn Io) -> Result<Stack, VmError> {
        loop {
            if self.tick(io)? {
                break;
            }
        }
        Ok(mem::take(&mut self.stack))
    }

    /// Executes one instruction cycle: lookup, dispatch, then (unless
    /// a halt or teleport occurred) step the IP. Returns `true` on `;`.
    fn tick(&mut self, io: &mut dyn Io) -> Result<bool, VmError> {
        let (x, y) = self.pos;
        let cell = self.grid.lookup(x, y);
        trace!("tick ({x},{y}) {:?} {:#x}", cell.category, cell.codepoint);
        let mut teleported = false;

        if self.skip {
            self.skip = false;
        } else if let Some(closing) = self.slurp {
            if cell.codepoint == closing {
                self.slurp = None;
            } else {
                self.stack.push_top(Rational::from_int(cell.codepoint as i64));
            }
        } else {
            match cell.category {
                Category::Noun => {
                    self.stack.push_top(Rational::from_int(glyph::noun_value(cell.codepoint)));
                }
                Category::Dyadic => self.exec_dyadic(cell.codepoint)?,
                Category::Stack => self.exec_stack(cell.codepoint)?,
                Category::Mirror => self.exec_mirror(cell.codepoint),
                Category::Control => {
                    let (halt, tp) = self.exec_control(cell.codepoint, io)?;
                    if halt {
                        return Ok(true);
                    }
                    teleported = tp;
                }
                Category::Quote => self.slurp = Some(cell.codepoint),
                Category::Other => return Err(VmError::InvalidInstruction(cell.codepoint)),
            }
        }

        if !teleported {
            self.advance();
        }
        Ok(false)
    }

    fn pop(&mut self) -> Result<Rational, VmError> {
        self.stack.pop_top().ok_or(VmError::StackUnderflow)
    }

    fn exec_dyadic(&mut self, codepoint: u32) -> Result<(), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match codepoint {
            0x25 => a.modulo(&b)?,
            0x2a => a.mul(&b),
            0x2b => a.add(&b),
            0x2c => a.div(&b)?,
            0x2d => a.sub(&b),
            0x28 => Rational::from_bool(a.lt(&b)),
            0x29 => Rational::from_bool(a.gt(&b)),
            0x3d => Rational::from_bool(a.eq_value(&b)),
            _ => unreachable!("non-dyadic codepoint {codepoint:#x}"),
        };
        self.stack.push_top(result);
        Ok(())
    }

    fn exec_stack(&mut self, codepoint: u32) -> Result<(), VmError> {
        match codepoint {
            0x24 => {
                // $ swap top two
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push_top(b);
                self.stack.push_top(a);
            }
            0x3a => {
                // : duplicate top
                let top = self.stack.peek_top().cloned().ok_or(VmError::StackUnderflow)?;
                self.stack.push_top(top);
            }
            0x40 => {
                // @ rotate top three right
                let c = self.pop()?;
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push_top(c);
                self.stack.push_top(a);
                self.stack.push_top(b);
            }
            0x5b => {
                // [ split top n into a new current stack
                let n = self.pop()?.to_int();
                if n < 0 {
                    return Err(VmError::StackUnderflowSplit);
                }
                let top_n = self
                    .stack
                    .split_top(n as usize)
                    .ok_or(VmError::StackUnderflowSplit)?;
                let parent = mem::replace(&mut self.stack, Stack::from_vec(top_n));
                self.stacks.push(parent);
                self.registers.push(self.register.take());
                debug!("entered scope, depth {}", self.stacks.len());
            }
            0x5d => {
                // ] merge current back into parent
                match (self.stacks.pop(), self.registers.pop()) {
                    (Some(mut parent), Some(saved_register)) => {
                        let current = mem::take(&mut self.stack);
                        parent.append(current);
                        self.stack = parent;
                        self.register = saved_register;
                    }
                    _ => {
                        self.stack = Stack::new();
                        self.register = None;
                    }
                }
                debug!("left scope, depth {}", self.stacks.len());
            }
            0x6c => {
                // l push current length
                let len = self.stack.len();
                self.stack.push_top(Rational::from_int(len as i64));
            }
            0x72 => self.stack.reverse(), // r
            0x7b => {
                // { shift left: bottom to top
                let bottom = self.stack.pop_bottom().ok_or(VmError::StackUnderflow)?;
                self.stack.push_top(bottom);
            }
            0x7d => {
                // } shift right: top to bottom
                let top = self.pop()?;
                self.stack.push_bottom(top);
            }
            0x7e => {
                self.pop()?; // ~ discard
            }
            _ => unreachable!("non-stack codepoint {codepoint:#x}"),
        }
        Ok(())
    }

    fn exec_mirror(&mut self, codepoint: u32) {
        let (dx, dy) = self.dir;
        self.dir = match codepoint {
            0x23 => (-dx, -dy),
            0x2f => (-dy, -dx),
            0x5c => (dy, dx),
            0x7c => (-dx, dy),
            0x5f => (dx, -dy),
            0x3c => (-1, 0),
            0x3e => (1, 0),
            0x5e => (0, -1),
            0x76 => (0, 1),
            0x78 => match self.rng.as_mut() {
                Some(rng) => DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())],
                None => (dx, dy),
            },
            _ => unreachable!("non-mirror codepoint {codepoint:#x}"),
        };
    }

    fn exec_control(&mut self, codepoint: u32, io: &mut dyn Io) -> Result<(bool, bool), VmError> {
        match codepoint {
            0x00 | 0x20 => {}
            0x21 => self.skip = true, // !
            0x26 => {
                // & register toggle
                match self.register.take() {
                    Some(v) => self.stack.push_top(v),
                    None => self.register = Some(self.pop()?),
                }
            }
            0x2e => {
                // . teleport; does not step this tick
                let y = self.pop()?.to_int();
                let x = self.pop()?.to_int();
                self.pos = (x, y);
                return Ok((false, true));
            }
            0x3b => return Ok((true, false)), // ;
            0x3f => {
                // ? conditional skip
                let v = self.pop()?;
                if !v.to_bool() {
                    self.skip = true;
                }
            }
            0x67 => {
                // g read grid cell
                let y = self.pop()?.to_int();
                let x = self.pop()?.to_int();
                let cp = self.grid.lookup(x, y).codepoint;
                self.stack.push_top(Rational::from_int(cp as i64));
            }
            0x69 => {
                // i read one input unit
                let v = io.read_unit()?;
                self.stack.push_top(Rational::from_int(v));
            }
            0x6e => {
                // n write number
                let v = self.pop()?;
                io.write_str(&v.to_string())?;
            }
            0x6f => {
                // o write codepoint
                let v = self.pop()?.to_int();
                let cp = u32::try_from(v)
                    .ok()
                    .filter(|&cp| char::from_u32(cp).is_some())
                    .ok_or(VmError::InvalidOutputCodepoint(v))?;
                io.write_codepoint(cp)?;
            }
            0x70 => {
                // p write grid cell
                let y = self.pop()?.to_int();
                let x = self.pop()?.to_int();
                let v = self.pop()?.to_int();
                self.grid.put(x, y, v as u32);
            }
            _ => unreachable!("non-control codepoint {codepoint:#x}"),
        }
        Ok((false, false))
    }

    /// Steps the IP by the current heading, wrapping toroidally over the
    /// *current row's* x-extent and the *current column's* y-extent.
    fn advance(&mut self) {
        let (pcx, pcy) = self.pos;
        let (dx, dy) = self.dir;

        let mut x = pcx + dx;
        let rmax = self.grid.row_max(pcy);
        if x < 0 || x > rmax {
            if dx > 0 {
                x = 0;
            } else if dx < 0 {
                x = rmax;
            }
        }

        let mut y = pcy + dy;
        let cmax = self.grid.col_max(pcx);
        if y < 0 || y > cmax {
            if dy > 0 {
                y = 0;
            } else if dy < 0 {
                y = cmax;
            }
        }

        self.pos = (x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;

    struct NullIo {
        input: Vec<i64>,
        output: String,
    }

    impl Io for NullIo {
        fn read_unit(&mut self) -> Result<i64, VmError> {
            Ok(self.input.pop().unwrap_or(-1))
        }
        fn write_str(&mut self, s: &str) -> Result<(), VmError> {
            self.output.push_str(s);
            Ok(())
        }
        fn write_codepoint(&mut self, cp: u32) -> Result<(), VmError> {
            self.output.push(char::from_u32(cp).unwrap());
            Ok(())
        }
    }

    fn run_source(src: &str) -> (Stack, String) {
        let grid = loader::parse(src);
        let mut vm = Vm::new(grid, Stack::new(), None);
        let mut io = NullIo { input: Vec::new(), output: String::new() };
        let stack = vm.run(&mut io).expect("script should run to completion");
        (stack, io.output)
    }

    fn top(stack: &Stack) -> Rational {
        stack.peek_top().cloned().expect("expected a value on the stack")
    }

    #[test]
    fn pushes_nouns_and_adds() {
        let (stack, _) = run_source("12+;");
        assert_eq!(top(&stack), Rational::from_int(3));
    }

    #[test]
    fn wraps_around_a_single_row() {
        // Row 0 teleports the IP to (3, 1); row 1 (`1>;2`, row_max=3) then
        // executes its `2`, steps off the right edge, wraps to column 0,
        // and runs `1>;` to completion.
        let (stack, _) = run_source("31.\n1>;2");
        assert_eq!(top(&stack), Rational::from_int(1));
    }

    #[test]
    fn quote_mode_pushes_codepoints() {
        let (stack, _) = run_source("\"ab\";");
        let vals: Vec<i64> = {
            let mut s = stack.clone();
            let mut out = Vec::new();
            while let Some(v) = s.pop_top() {
                out.push(v.to_int());
            }
            out
        };
        assert_eq!(vals, vec!['b' as i64, 'a' as i64]);
    }

    #[test]
    fn split_and_merge_round_trip() {
        // Builds [1,2,3], pushes a split count of 2, then `[` moves the
        // top 2 (2,3) into a fresh current stack, leaving [1] as the
        // parent; `]` merges back to [1,2,3], then `+` adds the top two.
        let (stack, _) = run_source("1232[]+;");
        assert_eq!(top(&stack), Rational::from_int(5));
    }

    #[test]
    fn division_by_zero_is_fatal() {
        let grid = loader::parse("10,;");
        let mut vm = Vm::new(grid, Stack::new(), None);
        let mut io = NullIo { input: Vec::new(), output: String::new() };
        let err = vm.run(&mut io).unwrap_err();
        assert!(matches!(err, VmError::DivByZero));
    }

    #[test]
    fn register_round_trips_a_value() {
        let (stack, _) = run_source("5&&;");
        assert_eq!(top(&stack), Rational::from_int(5));
    }

    #[test]
    fn no_prng_makes_x_a_no_op() {
        let grid = loader::parse("1x;2");
        let mut vm = Vm::new(grid, Stack::new(), None);
        let mut io = NullIo { input: Vec::new(), output: String::new() };
        let stack = vm.run(&mut io).unwrap();
        assert_eq!(top(&stack), Rational::from_int(1));
    }

    #[test]
    fn o_writes_the_utf8_codepoint() {
        // a=10, *6=60, +5=65 -> 'A'
        let (_, out) = run_source("a6*5+o;");
        assert_eq!(out, "A");
    }

    #[test]
    fn n_writes_the_decimal_form() {
        let (_, out) = run_source("a6*5+n;");
        assert_eq!(out, "65");
    }

    #[test]
    fn division_renders_as_a_terminating_decimal() {
        let (_, out) = run_source("15,n;");
        assert_eq!(out, "0.2");
    }

    fn to_vec(mut s: Stack) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(v) = s.pop_bottom() {
            out.push(v.to_int());
        }
        out
    }

    #[test]
    fn double_reverse_is_identity() {
        let (stack, _) = run_source("123rr;");
        assert_eq!(to_vec(stack), vec![1, 2, 3]);
    }

    #[test]
    fn shift_left_then_right_is_identity() {
        let (stack, _) = run_source("1234{};");
        assert_eq!(to_vec(stack), vec![1, 2, 3, 4]);
    }

    #[test]
    fn shift_right_then_left_is_identity() {
        let (stack, _) = run_source("1234}{;");
        assert_eq!(to_vec(stack), vec![1, 2, 3, 4]);
    }

    #[test]
    fn dup_then_discard_is_identity() {
        let (stack, _) = run_source("123:~;");
        assert_eq!(to_vec(stack), vec![1, 2, 3]);
    }

    #[test]
    fn length_is_snapshotted_before_its_own_push() {
        let (stack, _) = run_source("123l;");
        assert_eq!(top(&stack), Rational::from_int(3));
    }

    #[test]
    fn poke_then_peek_round_trips_a_cell() {
        // push v=9, x=0, y=1 then `p`; then push x=0,y=1 then `g`.
        let (stack, _) = run_source("901p01g;");
        assert_eq!(top(&stack), Rational::from_int(9));
    }
}
