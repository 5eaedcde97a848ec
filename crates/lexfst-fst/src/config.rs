// Traversal configuration / state stack for the lookup engine.

/// Explicit DFS stack used while walking one section of a compiled
/// dictionary.
///
/// The state and output stacks have a fixed capacity of `buffer_size`;
/// traversal gives up rather than grow past it. The mapped input is stored
/// separately and sized to the input.
pub struct TraversalConfig {
    pub buffer_size: usize,
    pub stack_depth: usize,
    pub input_depth: usize,

    /// State index at each stack depth.
    pub state_index_stack: Vec<u32>,
    /// Current slot index at each stack depth.
    pub current_transition_stack: Vec<u32>,
    /// Output symbol id at each stack depth (0 for epsilon).
    pub output_symbol_stack: Vec<u16>,
    /// Pre-mapped input symbol ids.
    pub input_symbols: Vec<u16>,
}

impl TraversalConfig {
    /// Create a configuration whose stacks hold `buffer_size` entries.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            stack_depth: 0,
            input_depth: 0,
            state_index_stack: vec![0; buffer_size],
            current_transition_stack: vec![0; buffer_size],
            output_symbol_stack: vec![0; buffer_size],
            input_symbols: Vec::new(),
        }
    }

    /// Grow the stacks to hold at least `buffer_size` entries.
    pub fn reserve_depth(&mut self, buffer_size: usize) {
        if buffer_size <= self.buffer_size {
            return;
        }
        self.buffer_size = buffer_size;
        self.state_index_stack.resize(buffer_size, 0);
        self.current_transition_stack.resize(buffer_size, 0);
        self.output_symbol_stack.resize(buffer_size, 0);
    }

    /// Number of mapped input symbols.
    #[inline]
    pub fn input_length(&self) -> usize {
        self.input_symbols.len()
    }

    /// Clear the input and the stack (called at the start of `prepare`).
    pub fn reset(&mut self) {
        self.input_symbols.clear();
        self.rewind();
    }

    /// Move back to the start state, keeping the mapped input.
    pub fn rewind(&mut self) {
        self.stack_depth = 0;
        self.input_depth = 0;
        if self.buffer_size > 0 {
            self.state_index_stack[0] = 0;
            self.current_transition_stack[0] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_at_start() {
        let config = TraversalConfig::new(16);
        assert_eq!(config.stack_depth, 0);
        assert_eq!(config.state_index_stack.len(), 16);
        assert_eq!(config.input_length(), 0);
    }

    #[test]
    fn rewind_keeps_input() {
        let mut config = TraversalConfig::new(8);
        config.input_symbols.extend([1, 2, 3]);
        config.stack_depth = 2;
        config.input_depth = 2;
        config.state_index_stack[0] = 7;
        config.rewind();
        assert_eq!(config.stack_depth, 0);
        assert_eq!(config.input_depth, 0);
        assert_eq!(config.state_index_stack[0], 0);
        assert_eq!(config.input_length(), 3);

        config.reset();
        assert_eq!(config.input_length(), 0);
    }

    #[test]
    fn reserve_depth_only_grows() {
        let mut config = TraversalConfig::new(8);
        config.reserve_depth(4);
        assert_eq!(config.buffer_size, 8);
        config.reserve_depth(32);
        assert_eq!(config.buffer_size, 32);
        assert_eq!(config.state_index_stack.len(), 32);
        assert_eq!(config.current_transition_stack.len(), 32);
        assert_eq!(config.output_symbol_stack.len(), 32);
    }
}
