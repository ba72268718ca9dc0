mod composite_index;
