mod canvas;
mod menu_bar;
mod node_panel;
